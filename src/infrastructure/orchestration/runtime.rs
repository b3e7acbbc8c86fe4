//! Daemon lifecycle: start background loops, run the console, tear down.

use std::sync::Arc;

use tracing::{error, info};

use super::startup::{prepare_node, verify_topo_index, PreparedNode};
use crate::adapter::inbound::terminal::{CommandCompleter, EditorLines, Prompt};
use crate::application::console::{CommandRegistry, Dispatcher, LineSource};
use crate::application::context::NodeContext;
use crate::application::diagnostics;
use crate::application::shutdown::{DrainOutcome, ShutdownCoordinator};
use crate::application::telemetry::{Sampler, StatusRenderer, StatusSink};
use crate::error::Result;
use crate::infrastructure::config::Settings;
use crate::port::outbound::LogLevelControl;

/// Run the daemon on the terminal until the operator exits or an interrupt
/// arrives.
///
/// # Errors
/// Fails when wiring fails or the startup index check finds corruption.
pub async fn run(settings: Settings, log: Arc<dyn LogLevelControl>) -> Result<DrainOutcome> {
    settings.log_summary();

    let PreparedNode { ctx, devnet } = prepare_node(&settings, log)?;
    if let Err(e) = verify_topo_index(ctx.chain.as_ref(), settings.startup_check_depth) {
        error!(error = %e, "Startup index check failed");
        return Err(e);
    }

    ctx.subsystems
        .spawn("devnet", devnet.run(ctx.shutdown.subscribe()));

    let prompt = Prompt::default();
    let completer = CommandCompleter::new(CommandRegistry::standard().names());
    let mut input = EditorLines::spawn(completer, prompt.clone())?;
    Ok(run_with_console(ctx, &settings, &mut input, Arc::new(prompt)).await)
}

/// Start the background loops, drive the console from `input` and drain.
/// Rendered status lines go to `status`.
pub async fn run_with_console(
    ctx: NodeContext,
    settings: &Settings,
    input: &mut dyn LineSource,
    status: Arc<dyn StatusSink>,
) -> DrainOutcome {
    let coordinator = ShutdownCoordinator::new(
        ctx.shutdown.clone(),
        ctx.subsystems.clone(),
        settings.drain_timeout,
    );
    coordinator.listen_for_interrupt();

    ctx.subsystems.spawn("sampler", Sampler::new(ctx.clone()).run());
    ctx.subsystems.spawn(
        "renderer",
        StatusRenderer::new(ctx.clone(), status).run(),
    );
    ctx.subsystems
        .spawn("diagnostics_schedule", diagnostics::run_schedule(ctx.clone()));

    info!(network = %ctx.env.network, "Node running, type help for commands");

    let registry = Arc::new(CommandRegistry::standard());
    let mut dispatcher = Dispatcher::new(ctx.clone(), registry, Box::new(std::io::stdout()));
    dispatcher.run(input).await;

    ctx.shutdown.fire();
    let outcome = coordinator
        .finish(&ctx.servers, ctx.network.as_ref(), ctx.chain.as_ref())
        .await;
    info!(?outcome, "Daemon stopped");
    outcome
}
