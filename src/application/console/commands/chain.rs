//! Block, transaction and index commands.

use std::io::Write;

use owo_colors::OwoColorize;
use tracing::info;

use super::super::command::{parse_arg, Arity, CommandHandler, CommandOutcome};
use super::super::output;
use crate::application::context::NodeContext;
use crate::application::repair::{repair_topo_index, RepairPlan};
use crate::domain::{BlockId, BlockKind, TxId, TxLocation};
use crate::error::CommandError;
use crate::port::outbound::ChainStore;

/// A block addressed either by hash or by topological height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockRef {
    Id(BlockId),
    Topo(i64),
}

fn parse_block_ref(value: &str, usage: &'static str) -> Result<BlockRef, CommandError> {
    if BlockId::looks_like(value) {
        parse_arg(value, usage).map(BlockRef::Id)
    } else {
        parse_arg(value, usage).map(BlockRef::Topo)
    }
}

/// Check `start..=stop` against the committed topo range.
fn check_range(start: i64, stop: i64, topo: i64) -> Result<(), CommandError> {
    if start < 0 || start > topo {
        return Err(CommandError::Rejected(format!(
            "start value should be between 0 and current topo height {topo}"
        )));
    }
    if stop < start || stop > topo {
        return Err(CommandError::Rejected(format!(
            "stop value should be between {start} and current topo height {topo}"
        )));
    }
    Ok(())
}

fn parse_range(args: &[String], usage: &'static str) -> Result<(i64, i64), CommandError> {
    Ok((parse_arg(&args[0], usage)?, parse_arg(&args[1], usage)?))
}

// ----------------------------------------------------------------------------
// print_bc
// ----------------------------------------------------------------------------

pub struct PrintBc;

impl CommandHandler for PrintBc {
    fn name(&self) -> &'static str {
        "print_bc"
    }

    fn usage(&self) -> &'static str {
        "print_bc <start> <stop>"
    }

    fn summary(&self) -> &'static str {
        "Print committed blocks in a topo height range"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_range(args, self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let (start, stop) = parse_range(args, self.usage())?;
        check_range(start, stop, ctx.chain.topo_height())?;

        for topo in start..=stop {
            let entry = ctx.chain.read_topo_entry(topo)?;
            let header = ctx.chain.load_block(&entry.block_id)?;
            let root = ctx.chain.state_root(entry.snapshot_version)?;
            writeln!(
                out,
                "topo height: {topo:>10}  height: {:>10}  timestamp: {:>14}  difficulty: {}",
                header.height,
                header.timestamp.timestamp_millis(),
                header.difficulty
            )?;
            writeln!(out, "block id: {}  balance tree hash: {root}", entry.block_id)?;
        }
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// print_block
// ----------------------------------------------------------------------------

pub struct PrintBlock;

impl CommandHandler for PrintBlock {
    fn name(&self) -> &'static str {
        "print_block"
    }

    fn usage(&self) -> &'static str {
        "print_block <hash|topo height>"
    }

    fn summary(&self) -> &'static str {
        "Print a block's header, tips, miniblocks and transactions"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_block_ref(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let id = match parse_block_ref(&args[0], self.usage())? {
            BlockRef::Id(id) => id,
            BlockRef::Topo(topo) => ctx.chain.block_at_topo(topo)?,
        };
        let header = ctx.chain.load_block(&id)?;

        output::field(out, "BLID", header.id)?;
        output::field(
            out,
            "Version",
            format!("major {} minor {}", header.major_version, header.minor_version),
        )?;
        output::field(out, "Height", header.height)?;
        output::field(out, "Timestamp", header.timestamp.to_rfc3339())?;
        output::field(out, "Kind", format!("{:?}", header.kind))?;
        for (i, tip) in header.tips.iter().enumerate() {
            writeln!(out, "Past {i}: {tip}")?;
        }
        for (i, miner) in header.miniblock_miners.iter().enumerate() {
            writeln!(out, "Mini {i}: {miner}")?;
        }
        for (i, tx) in header.tx_hashes.iter().enumerate() {
            writeln!(out, "tx {i}: {tx}")?;
        }
        output::field(out, "Difficulty", header.difficulty)?;

        match ctx.chain.topo_of(&id) {
            Ok(topo) => {
                output::field(out, "TopoHeight", topo)?;
                let version = ctx.chain.snapshot_version(&id)?;
                output::field(out, "BALANCE_TREE", ctx.chain.state_root(version)?)?;
            }
            Err(_) => output::field(out, "TopoHeight", "not committed")?,
        }
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// print_tx
// ----------------------------------------------------------------------------

pub struct PrintTx;

impl CommandHandler for PrintTx {
    fn name(&self) -> &'static str {
        "print_tx"
    }

    fn usage(&self) -> &'static str {
        "print_tx <hash>"
    }

    fn summary(&self) -> &'static str {
        "Show where a mined transaction ended up"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_arg::<TxId>(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let id: TxId = parse_arg(&args[0], self.usage())?;
        let record = ctx.chain.transaction(&id)?;

        output::field(out, "TXID", record.id)?;
        if record.registration {
            writeln!(out, "Registration TX validity could not be detected")?;
            return Ok(CommandOutcome::Continue);
        }
        match record.location {
            TxLocation::Valid(block) => writeln!(out, "TX is valid in block {block}")?,
            TxLocation::SideChain => writeln!(out, "TX is mined in a side chain")?,
            TxLocation::Invalid(blocks) => {
                let list: Vec<String> = blocks.iter().map(ToString::to_string).collect();
                writeln!(out, "TX is mined in blocks [{}]", list.join(" "))?;
            }
        }
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// block_export / block_import
// ----------------------------------------------------------------------------

pub struct BlockExport;

impl CommandHandler for BlockExport {
    fn name(&self) -> &'static str {
        "block_export"
    }

    fn usage(&self) -> &'static str {
        "block_export <hash>"
    }

    fn summary(&self) -> &'static str {
        "Write a block to the export directory"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_arg::<BlockId>(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let id: BlockId = parse_arg(&args[0], self.usage())?;
        let bytes = ctx.chain.export_block(&id)?;

        std::fs::create_dir_all(&ctx.env.export_dir)?;
        let path = ctx.env.export_dir.join(format!("{id}.block"));
        std::fs::write(&path, &bytes)?;

        info!(block = %id, path = %path.display(), bytes = bytes.len(), "Block exported");
        output::success(out, format!("block exported to {}", path.display()))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct BlockImport;

impl CommandHandler for BlockImport {
    fn name(&self) -> &'static str {
        "block_import"
    }

    fn usage(&self) -> &'static str {
        "block_import <hash>"
    }

    fn summary(&self) -> &'static str {
        "Add a block previously written by block_export"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_arg::<BlockId>(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let id: BlockId = parse_arg(&args[0], self.usage())?;
        let path = ctx.env.export_dir.join(format!("{id}.block"));
        let bytes = std::fs::read(&path)?;
        let imported = ctx.chain.import_block(&bytes)?;

        info!(block = %imported, path = %path.display(), "Block imported");
        output::success(out, format!("block {imported} imported"))?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// fix
// ----------------------------------------------------------------------------

pub struct Fix;

impl CommandHandler for Fix {
    fn name(&self) -> &'static str {
        "fix"
    }

    fn usage(&self) -> &'static str {
        "fix"
    }

    fn summary(&self) -> &'static str {
        "Walk the chain from the tip and repair the topo index"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let report = repair_topo_index(ctx.chain.as_ref(), RepairPlan::full())?;

        for entry in &report.repaired {
            let previous = entry
                .previous
                .map_or_else(|| "missing".to_string(), |id| id.to_string());
            writeln!(
                out,
                "height {:>10}: {} -> {} (version {})",
                entry.height,
                previous.red(),
                entry.block_id.green(),
                entry.snapshot_version
            )?;
        }
        if report.is_clean() {
            output::success(out, format!("topo index consistent, {} heights checked", report.visited))?;
        } else {
            output::success(
                out,
                format!(
                    "repaired {} of {} heights checked",
                    report.repaired.len(),
                    report.visited
                ),
            )?;
        }
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// graph
// ----------------------------------------------------------------------------

/// File `graph` writes into the data directory.
pub const GRAPH_FILE: &str = "graph.dot";

/// Graphviz rendering of every block stored at heights `start..stop`.
///
/// Side blocks are yellow and sync blocks green. Tip edges are drawn only for
/// blocks above `start` so the graph does not dangle below the range.
///
/// # Errors
/// Fails when a block id appears at two heights or a block cannot be loaded.
pub fn render_dot(chain: &dyn ChainStore, start: i64, stop: i64) -> Result<String, CommandError> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();
    for height in start..stop {
        for id in chain.blocks_at_height(height) {
            if !seen.insert(id) {
                return Err(CommandError::Rejected(format!(
                    "duplicate block {id} found at height {height}"
                )));
            }
            ordered.push(id);
        }
    }

    let mut dot = String::from("digraph dag_graph {\n");
    for id in ordered {
        let header = chain.load_block(&id)?;
        let color = match header.kind {
            BlockKind::Side => "yellow",
            BlockKind::Sync => "green",
            BlockKind::Normal => "white",
        };
        let order = chain.topo_of(&id).unwrap_or(-1);
        dot.push_str("node [ fontsize=12 style=filled ]\n");
        dot.push_str(&format!(
            "L{id} [ fillcolor={color} label = \"{id} height {} order {order}\\nminer {}\" ];\n",
            header.height, header.miner
        ));
        if header.height > start {
            for tip in &header.tips {
                dot.push_str(&format!("L{tip} -> L{id} ;\n"));
            }
        }
    }
    dot.push_str("}\n");
    Ok(dot)
}

pub struct Graph;

impl CommandHandler for Graph {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn usage(&self) -> &'static str {
        "graph <start> <stop>"
    }

    fn summary(&self) -> &'static str {
        "Write a Graphviz DOT file of the DAG between two heights"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_range(args, self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let (start, stop) = parse_range(args, self.usage())?;
        check_range(start, stop, ctx.chain.topo_height())?;

        let dot = render_dot(ctx.chain.as_ref(), start, stop)?;
        std::fs::create_dir_all(&ctx.env.data_dir)?;
        let path = ctx.env.data_dir.join(GRAPH_FILE);
        std::fs::write(&path, dot)?;

        info!(start, stop, path = %path.display(), "Block graph written");
        output::success(out, format!("graph written to {}", path.display()))?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// pop
// ----------------------------------------------------------------------------

pub struct Pop;

impl Pop {
    fn count(&self, args: &[String]) -> Result<u64, CommandError> {
        match args.first() {
            None => Ok(1),
            Some(value) => match parse_arg::<u64>(value, self.usage())? {
                0 => Err(CommandError::Usage(self.usage())),
                n => Ok(n),
            },
        }
    }
}

impl CommandHandler for Pop {
    fn name(&self) -> &'static str {
        "pop"
    }

    fn usage(&self) -> &'static str {
        "pop [count]"
    }

    fn summary(&self) -> &'static str {
        "Rewind the chain by count blocks (default 1)"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        self.count(args).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let count = self.count(args)?;
        ctx.chain.rewind(count)?;
        ctx.counters.record_pop(count);

        let height = ctx.chain.height();
        info!(count, height, "Chain rewound");
        output::success(out, format!("popped {count} block(s), height now {height}"))?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// setintegratoraddress
// ----------------------------------------------------------------------------

pub struct SetIntegratorAddress;

impl CommandHandler for SetIntegratorAddress {
    fn name(&self) -> &'static str {
        "setintegratoraddress"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["set_integrator_address"]
    }

    fn usage(&self) -> &'static str {
        "setintegratoraddress <address>"
    }

    fn summary(&self) -> &'static str {
        "Change the address credited with integrator rewards"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let previous = ctx.chain.integrator_address();
        ctx.chain.set_integrator_address(&args[0])?;

        info!(previous = %previous, address = %args[0], "Integrator address changed");
        output::success(out, format!("integrator address set to {}", args[0]))?;
        Ok(CommandOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryChain;

    #[test]
    fn range_checks_follow_topo_height() {
        assert!(check_range(0, 10, 10).is_ok());
        assert!(matches!(check_range(-1, 5, 10), Err(CommandError::Rejected(_))));
        assert!(matches!(check_range(11, 11, 10), Err(CommandError::Rejected(_))));
        assert!(matches!(check_range(5, 4, 10), Err(CommandError::Rejected(_))));
        assert!(matches!(check_range(5, 11, 10), Err(CommandError::Rejected(_))));
    }

    #[test]
    fn block_ref_distinguishes_hash_and_height() {
        let hash = "ab".repeat(32);
        assert!(matches!(parse_block_ref(&hash, "u"), Ok(BlockRef::Id(_))));
        assert_eq!(parse_block_ref("42", "u").unwrap(), BlockRef::Topo(42));
        assert!(matches!(parse_block_ref("tip", "u"), Err(CommandError::Usage("u"))));
    }

    #[test]
    fn pop_count_defaults_to_one_and_rejects_zero() {
        assert_eq!(Pop.count(&[]).unwrap(), 1);
        assert_eq!(Pop.count(&["3".into()]).unwrap(), 3);
        assert!(matches!(Pop.count(&["0".into()]), Err(CommandError::Usage(_))));
        assert!(matches!(Pop.count(&["-2".into()]), Err(CommandError::Usage(_))));
    }

    #[test]
    fn dot_colors_side_and_sync_blocks() {
        let chain = MemoryChain::new();
        chain.extend(12);
        let side = chain.add_side_block(5, "side-miner").unwrap();

        let dot = render_dot(&chain, 4, 11).unwrap();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains(&format!("L{side} [ fillcolor=yellow")));
        let sync = chain.block_at_topo(10).unwrap();
        assert!(dot.contains(&format!("L{sync} [ fillcolor=green")));
        // no edges into the lowest height
        let first = chain.block_at_topo(4).unwrap();
        assert!(!dot.contains(&format!("-> L{first} ;")));
        let parent = chain.block_at_topo(5).unwrap();
        let child = chain.block_at_topo(6).unwrap();
        assert!(dot.contains(&format!("L{parent} -> L{child} ;")));
    }
}
