//! Mempool and regpool commands.

use std::io::Write;
use std::sync::Arc;

use tabled::Tabled;
use tracing::info;

use super::super::command::{parse_arg, Arity, CommandHandler, CommandOutcome};
use super::super::output;
use crate::application::context::NodeContext;
use crate::domain::TxId;
use crate::error::CommandError;
use crate::port::outbound::TxPool;

/// Which pool a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Mempool,
    Regpool,
}

impl PoolKind {
    fn pool(self, ctx: &NodeContext) -> &Arc<dyn TxPool> {
        match self {
            Self::Mempool => &ctx.mempool,
            Self::Regpool => &ctx.regpool,
        }
    }
}

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "TXID")]
    id: String,
    #[tabled(rename = "Size")]
    size: usize,
    #[tabled(rename = "Fee")]
    fee: u64,
    #[tabled(rename = "Added")]
    added: String,
}

pub struct PoolPrint(pub PoolKind);

impl CommandHandler for PoolPrint {
    fn name(&self) -> &'static str {
        match self.0 {
            PoolKind::Mempool => "mempool_print",
            PoolKind::Regpool => "regpool_print",
        }
    }

    fn usage(&self) -> &'static str {
        self.name()
    }

    fn summary(&self) -> &'static str {
        "Print pooled transactions, highest fee first"
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
        let pool = self.0.pool(ctx);
        let rows: Vec<PoolRow> = pool
            .entries()
            .into_iter()
            .map(|e| PoolRow {
                id: e.id.to_string(),
                size: e.size,
                fee: e.fee,
                added: e.added_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect();

        output::section(out, format!("{} ({} transactions)", pool.name(), rows.len()))?;
        output::table(out, rows)?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct PoolFlush(pub PoolKind);

impl CommandHandler for PoolFlush {
    fn name(&self) -> &'static str {
        match self.0 {
            PoolKind::Mempool => "mempool_flush",
            PoolKind::Regpool => "regpool_flush",
        }
    }

    fn usage(&self) -> &'static str {
        self.name()
    }

    fn summary(&self) -> &'static str {
        "Drop every pooled transaction"
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
        let pool = self.0.pool(ctx);
        let dropped = pool.flush();
        info!(pool = pool.name(), dropped, "Pool flushed");
        output::success(out, format!("{} flushed, {dropped} transaction(s) dropped", pool.name()))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct PoolDeleteTx(pub PoolKind);

impl CommandHandler for PoolDeleteTx {
    fn name(&self) -> &'static str {
        match self.0 {
            PoolKind::Mempool => "mempool_delete_tx",
            PoolKind::Regpool => "regpool_delete_tx",
        }
    }

    fn usage(&self) -> &'static str {
        match self.0 {
            PoolKind::Mempool => "mempool_delete_tx <txid>",
            PoolKind::Regpool => "regpool_delete_tx <txid>",
        }
    }

    fn summary(&self) -> &'static str {
        "Remove one transaction from the pool"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
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
        let pool = self.0.pool(ctx);
        if !pool.delete(&id) {
            return Err(CommandError::Rejected(format!("txid {id} not found in {}", pool.name())));
        }
        info!(pool = pool.name(), tx = %id, "Transaction removed from pool");
        output::success(out, format!("txid {id} removed from {}", pool.name()))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct MempoolDump;

impl CommandHandler for MempoolDump {
    fn name(&self) -> &'static str {
        "mempool_dump"
    }

    fn usage(&self) -> &'static str {
        "mempool_dump"
    }

    fn summary(&self) -> &'static str {
        "Write every mempool transaction to <data-dir>/mempool"
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
        let dir = ctx.env.data_dir.join("mempool");
        std::fs::create_dir_all(&dir)?;

        let mut written = 0usize;
        for entry in ctx.mempool.entries() {
            // Entries can leave the pool between listing and reading.
            if let Some(raw) = ctx.mempool.raw(&entry.id) {
                std::fs::write(dir.join(entry.id.to_string()), raw)?;
                written += 1;
            }
        }
        info!(dir = %dir.display(), written, "Mempool dumped");
        output::success(out, format!("{written} transaction(s) written to {}", dir.display()))?;
        Ok(CommandOutcome::Continue)
    }
}
