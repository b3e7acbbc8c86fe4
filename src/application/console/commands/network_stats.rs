//! Network mining statistics over the trailing stats window.

use std::io::Write;

use tabled::Tabled;

use super::super::command::{parse_arg, Arity, CommandHandler, CommandOutcome};
use super::super::output;
use super::window;
use crate::application::context::NodeContext;
use crate::application::statistics::{order_likelihoods, rank_miners, rank_nodes, DEFAULT_SHOW_COUNT};
use crate::error::CommandError;

fn show_count(args: &[String], usage: &'static str) -> Result<usize, CommandError> {
    match args.first() {
        Some(count) => parse_arg(count, usage),
        None => Ok(DEFAULT_SHOW_COUNT),
    }
}

// ----------------------------------------------------------------------------
// active_nodes
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node IP")]
    node: String,
    #[tabled(rename = "IB")]
    finals: u64,
    #[tabled(rename = "MB")]
    minis: u64,
    #[tabled(rename = "MBO")]
    orphans: String,
    #[tabled(rename = "Orphan Loss")]
    orphan_loss: String,
    #[tabled(rename = "Dominance")]
    dominance: String,
}

pub struct ActiveNodes;

impl CommandHandler for ActiveNodes {
    fn name(&self) -> &'static str {
        "active_nodes"
    }

    fn usage(&self) -> &'static str {
        "active_nodes [count]"
    }

    fn summary(&self) -> &'static str {
        "Rank peer nodes by blocks relayed in the stats window (default 25)"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        show_count(args, self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let count = show_count(args, self.usage())?;
        let ranked = rank_nodes(ctx.network.active_nodes(ctx.stats_window_start()));
        let total = ranked.len();

        let rows: Vec<NodeRow> = ranked
            .into_iter()
            .take(count)
            .map(|r| NodeRow {
                node: r.node,
                finals: r.counts.finals,
                minis: r.counts.minis,
                orphans: output::alert_count(r.counts.orphans),
                orphan_loss: output::pct(r.orphan_loss),
                dominance: output::pct(r.dominance),
            })
            .collect();

        output::section(
            out,
            format!(
                "Network Mining Node Stats - {} - Showing {}/{total} nodes",
                window(ctx),
                rows.len()
            ),
        )?;
        output::table(out, rows)?;
        writeln!(out, "Total Active Miner Node(s): {total}")?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// active_miners / miner_info
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct MinerRow {
    #[tabled(rename = "Miner Address")]
    miner: String,
    #[tabled(rename = "IB")]
    finals: u64,
    #[tabled(rename = "MB")]
    minis: u64,
    #[tabled(rename = "IBO")]
    ibo: String,
    #[tabled(rename = "MBO")]
    mbo: String,
    #[tabled(rename = "Orphan Loss")]
    orphan_loss: String,
    #[tabled(rename = "Dominance")]
    dominance: String,
    #[tabled(rename = "Node (Probability)")]
    node: String,
}

fn miner_row(ctx: &NodeContext, since: i64, rank: crate::application::statistics::MinerRank) -> MinerRow {
    let node = ctx
        .network
        .best_guess_miner_node(since, &rank.miner)
        .map_or_else(
            || "-".to_string(),
            |guess| format!("{} ({})", guess.name, output::pct(guess.likelihood)),
        );
    MinerRow {
        finals: rank.counts.finals,
        minis: rank.counts.minis,
        ibo: output::alert_count(rank.counts.ibo),
        mbo: output::alert_count(rank.counts.mbo),
        orphan_loss: output::pct(rank.orphan_loss),
        dominance: output::pct(rank.dominance),
        miner: rank.miner,
        node,
    }
}

pub struct ActiveMiners;

impl CommandHandler for ActiveMiners {
    fn name(&self) -> &'static str {
        "active_miners"
    }

    fn usage(&self) -> &'static str {
        "active_miners [count]"
    }

    fn summary(&self) -> &'static str {
        "Rank miner addresses by blocks in the stats window (default 25)"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        show_count(args, self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let count = show_count(args, self.usage())?;
        let since = ctx.stats_window_start();
        let ranked = rank_miners(ctx.network.active_miners(since));
        let total = ranked.len();

        let rows: Vec<MinerRow> = ranked
            .into_iter()
            .take(count)
            .map(|rank| miner_row(ctx, since, rank))
            .collect();

        output::section(
            out,
            format!(
                "Network Miner Stats - {} - Showing {}/{total} miners",
                window(ctx),
                rows.len()
            ),
        )?;
        output::table(out, rows)?;
        writeln!(out, "Total Active Miner(s): {total}")?;
        Ok(CommandOutcome::Continue)
    }
}

#[derive(Tabled)]
struct CandidateNodeRow {
    #[tabled(rename = "Node IP")]
    node: String,
    #[tabled(rename = "IB")]
    finals: u64,
    #[tabled(rename = "MB")]
    minis: u64,
    #[tabled(rename = "MBO")]
    orphans: String,
    #[tabled(rename = "Probability")]
    likelihood: String,
}

pub struct MinerInfo;

impl CommandHandler for MinerInfo {
    fn name(&self) -> &'static str {
        "miner_info"
    }

    fn usage(&self) -> &'static str {
        "miner_info <wallet>"
    }

    fn summary(&self) -> &'static str {
        "Show one miner's production and the nodes it likely mines through"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let wallet = &args[0];
        let since = ctx.stats_window_start();
        let window = window(ctx);

        let Some(rank) = rank_miners(ctx.network.active_miners(since))
            .into_iter()
            .find(|r| &r.miner == wallet)
        else {
            return Err(CommandError::Rejected(format!(
                "no activity for miner {wallet} in the {window}"
            )));
        };

        output::section(out, format!("Miner Info - {window}"))?;
        output::table(out, vec![miner_row(ctx, since, rank)])?;
        writeln!(out)?;

        let candidates: Vec<CandidateNodeRow> =
            order_likelihoods(ctx.network.potential_miner_nodes(since, wallet))
                .into_iter()
                .map(|l| CandidateNodeRow {
                    node: l.name,
                    finals: l.counts.finals,
                    minis: l.counts.minis,
                    orphans: output::alert_count(l.counts.orphans),
                    likelihood: output::pct(l.likelihood),
                })
                .collect();
        output::section(out, "Potential Miner Nodes")?;
        output::table(out, candidates)?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// mined_blocks
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct MinedRow {
    #[tabled(rename = "Wallet")]
    wallet: String,
    #[tabled(rename = "Height")]
    height: i64,
    #[tabled(rename = "Block")]
    block: String,
}

pub struct MinedBlocks;

impl CommandHandler for MinedBlocks {
    fn name(&self) -> &'static str {
        "mined_blocks"
    }

    fn usage(&self) -> &'static str {
        "mined_blocks"
    }

    fn summary(&self) -> &'static str {
        "List blocks produced by miners attached to this node"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let mined = ctx.network.mined_blocks();
        let size = mined.len();

        output::section(out, "Mined Blocks List")?;
        let mut rows = Vec::with_capacity(size);
        for block in mined {
            match ctx.chain.block_at_topo(block.height) {
                Ok(id) => rows.push(MinedRow {
                    wallet: block.miner,
                    height: block.height,
                    block: id.to_string(),
                }),
                Err(_) => writeln!(
                    out,
                    "Skipping block at topo height {} - likely not committed yet",
                    block.height
                )?,
            }
        }
        output::table(out, rows)?;
        writeln!(out, "Mined Blocks Collection Size: {size}")?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// list_miners / address_to_name
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct ConnectedMinerRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Wallet")]
    wallet: String,
    #[tabled(rename = "Blocks")]
    blocks: u64,
    #[tabled(rename = "Minis")]
    minis: u64,
    #[tabled(rename = "Rejected")]
    rejected: String,
}

pub struct ListMiners;

impl CommandHandler for ListMiners {
    fn name(&self) -> &'static str {
        "list_miners"
    }

    fn usage(&self) -> &'static str {
        "list_miners"
    }

    fn summary(&self) -> &'static str {
        "Print miners connected to the work server"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let rows: Vec<ConnectedMinerRow> = ctx
            .mining
            .connected_miners()
            .into_iter()
            .map(|m| ConnectedMinerRow {
                address: m.address,
                wallet: m.wallet,
                blocks: m.blocks,
                minis: m.minis,
                rejected: output::alert_count(m.rejected),
            })
            .collect();

        output::section(out, format!("Connected Miners ({})", rows.len()))?;
        output::table(out, rows)?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct AddressToName;

impl CommandHandler for AddressToName {
    fn name(&self) -> &'static str {
        "address_to_name"
    }

    fn usage(&self) -> &'static str {
        "address_to_name <address>"
    }

    fn summary(&self) -> &'static str {
        "Look up names registered to a wallet address"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let names = ctx.mining.address_to_name(&args[0])?;
        if names.is_empty() {
            writeln!(out, "no names registered to {}", args[0])?;
        } else {
            for name in names {
                writeln!(out, "  {name}")?;
            }
        }
        Ok(CommandOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::outbound::memory::{ActivityRecord, BlockClass};
    use crate::testkit::TestNode;

    fn record(node: &TestNode, height: i64, peer: &str, miner: &str, class: BlockClass, orphan: bool) {
        node.network.record(ActivityRecord {
            height,
            node: peer.into(),
            miner: miner.into(),
            class,
            orphan,
        });
    }

    fn node_with_activity() -> TestNode {
        let node = TestNode::builder().blocks(20).build();
        for height in 1..=3 {
            record(&node, height, "10.1.0.1", "deto1alpha", BlockClass::Final, false);
        }
        record(&node, 4, "10.1.0.2", "deto1bravo", BlockClass::Final, false);
        node
    }

    #[test]
    fn active_nodes_ranks_by_contribution() {
        let node = node_with_activity();
        let out = node.run("active_nodes");

        assert!(out.contains("Network Mining Node Stats - Last 20/100 Blocks - Showing 2/2 nodes"));
        assert!(out.contains("75.00%"));
        assert!(out.contains("25.00%"));
        assert!(out.find("10.1.0.1").unwrap() < out.find("10.1.0.2").unwrap());
        assert!(out.contains("Total Active Miner Node(s): 2"));
    }

    #[test]
    fn active_nodes_honours_count() {
        let node = node_with_activity();
        let out = node.run("active_nodes 1");
        assert!(out.contains("Showing 1/2 nodes"));
        assert!(!out.contains("10.1.0.2"));
    }

    #[test]
    fn active_miners_reports_totals() {
        let node = node_with_activity();
        let out = node.run("active_miners");
        assert!(out.contains("deto1alpha"));
        assert!(out.contains("Total Active Miner(s): 2"));
    }

    #[test]
    fn miner_info_without_activity_is_rejected() {
        let node = node_with_activity();
        let out = node.run("miner_info deto1nobody");
        assert!(out.contains("no activity for miner deto1nobody"));
    }

    #[test]
    fn miner_info_lists_candidate_nodes() {
        let node = node_with_activity();
        let out = node.run("miner_info deto1alpha");
        assert!(out.contains("Miner Info - Last 20/100 Blocks"));
        assert!(out.contains("Potential Miner Nodes"));
        assert!(out.contains("10.1.0.1"));
    }

    #[test]
    fn mined_blocks_skips_uncommitted_heights() {
        let node = TestNode::builder().blocks(5).build();
        node.network.record_mined("deto1alpha", 3);
        node.network.record_mined("deto1alpha", 99);

        let out = node.run("mined_blocks");
        assert!(out.contains("Skipping block at topo height 99"));
        assert!(out.contains("Mined Blocks Collection Size: 2"));
    }
}
