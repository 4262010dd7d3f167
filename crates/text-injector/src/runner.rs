use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use ui_platform::{AccessibilityPort, NodeAction, NodeHandle, PlatformError};

use crate::errors::InjectError;
use crate::model::{InjectCtx, InjectionMethod, InjectionReport};
use crate::policy::{InjectionPolicy, Strictness};
use crate::wait::settle;

pub struct RuntimeDeps<'a> {
    pub port: &'a dyn AccessibilityPort,
    pub policy: &'a InjectionPolicy,
}

#[instrument(skip_all, fields(app = %ctx.app, field = %field))]
pub async fn execute(
    ctx: &InjectCtx,
    field: &NodeHandle,
    text: &str,
    deps: RuntimeDeps<'_>,
) -> Result<InjectionReport, InjectError> {
    if text.is_empty() {
        return Err(InjectError::EmptyText);
    }
    if ctx.cancel.is_cancelled() {
        return Err(InjectError::Cancelled);
    }

    let started = Instant::now();
    let mut report = InjectionReport::default();

    for (index, method) in InjectionMethod::chain().into_iter().enumerate() {
        if index > 0 {
            settle(&ctx.cancel, deps.policy.between_methods()).await?;
        }
        report.attempted.push(method);
        debug!(method = method.name(), "Trying text entry method");

        let outcome = match run_method(ctx, &deps, field, text, method).await {
            Ok(true) => confirm(&deps, field, text).await,
            other => other,
        };

        match outcome {
            Ok(true) => {
                info!(method = method.name(), "Text entry acknowledged");
                report.success = true;
                report.method = Some(method);
                break;
            }
            Ok(false) => debug!(method = method.name(), "Text entry method not acknowledged"),
            Err(InjectError::Cancelled) => return Err(InjectError::Cancelled),
            Err(err) if err.is_stale() => {
                warn!(method = method.name(), "Field went stale during text entry");
                report.stale = true;
                break;
            }
            Err(err) => warn!(method = method.name(), error = %err, "Text entry method failed"),
        }
    }

    if !report.success && !report.stale {
        warn!("All text entry methods failed for this field");
    }
    report.elapsed = started.elapsed();
    Ok(report)
}

async fn run_method(
    ctx: &InjectCtx,
    deps: &RuntimeDeps<'_>,
    field: &NodeHandle,
    text: &str,
    method: InjectionMethod,
) -> Result<bool, InjectError> {
    let port = deps.port;
    let policy = deps.policy;
    match method {
        InjectionMethod::DirectSet => set_text(ctx, port, field, text, policy).await,
        InjectionMethod::ClickThenSet => {
            port.perform(field, NodeAction::Click).await?;
            settle(&ctx.cancel, policy.focus_settle()).await?;
            set_text(ctx, port, field, text, policy).await
        }
        InjectionMethod::FocusClearThenSet => {
            port.perform(field, NodeAction::Focus).await?;
            settle(&ctx.cancel, policy.clear_settle()).await?;
            port.perform(field, NodeAction::SetText(String::new())).await?;
            settle(&ctx.cancel, policy.clear_settle()).await?;
            set_text(ctx, port, field, text, policy).await
        }
        InjectionMethod::SimulatedTyping => simulate_typing(ctx, port, field, text, policy).await,
    }
}

async fn set_text(
    ctx: &InjectCtx,
    port: &dyn AccessibilityPort,
    field: &NodeHandle,
    text: &str,
    policy: &InjectionPolicy,
) -> Result<bool, InjectError> {
    let acknowledged = port
        .perform(field, NodeAction::SetText(text.to_string()))
        .await?;
    settle(&ctx.cancel, policy.direct_settle()).await?;
    Ok(acknowledged)
}

/// One set-text per character carrying the prefix typed so far. Stops at the
/// first keystroke the field refuses.
async fn simulate_typing(
    ctx: &InjectCtx,
    port: &dyn AccessibilityPort,
    field: &NodeHandle,
    text: &str,
    policy: &InjectionPolicy,
) -> Result<bool, InjectError> {
    port.perform(field, NodeAction::Click).await?;
    settle(&ctx.cancel, policy.focus_settle()).await?;

    let mut typed = String::with_capacity(text.len());
    for ch in text.chars() {
        typed.push(ch);
        let acknowledged = port
            .perform(field, NodeAction::SetText(typed.clone()))
            .await?;
        settle(&ctx.cancel, policy.keystroke()).await?;
        if !acknowledged {
            debug!(typed = typed.chars().count(), "Keystroke refused");
            return Ok(false);
        }
    }

    settle(&ctx.cancel, policy.typing_tail()).await?;
    Ok(true)
}

async fn confirm(
    deps: &RuntimeDeps<'_>,
    field: &NodeHandle,
    text: &str,
) -> Result<bool, InjectError> {
    if deps.policy.strictness == Strictness::AcknowledgeOnly {
        return Ok(true);
    }
    let Some(tree) = deps.port.current_tree().await? else {
        debug!("No tree to read back from");
        return Ok(false);
    };
    let Some(node) = tree.resolve(field) else {
        return Err(PlatformError::StaleNode(*field).into());
    };
    let matches = node.attrs().text_str() == text;
    if !matches {
        debug!(actual = node.attrs().text_str(), "Readback differs from target text");
    }
    Ok(matches)
}
