use crate::sandbox::SandboxContext;
use crate::task::StepResult;

pub(super) async fn write_file(ctx: &SandboxContext, path: &str, content: &str) -> StepResult {
    ctx.log().info(format!("Writing to file: {path}")).await;

    let target = match ctx.resolve(path).await {
        Ok(p) => p,
        Err(e) => return refuse(ctx, "write_file", path, e).await,
    };
    if let Some(parent) = target.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            return io_failure(ctx, "write_file", path, e).await;
        }
    }
    match tokio::fs::write(&target, content).await {
        Ok(()) => {
            ctx.log().info("File written successfully.").await;
            StepResult::succeeded(
                "write_file",
                format!("Wrote {} bytes to {path}", content.len()),
            )
        }
        Err(e) => io_failure(ctx, "write_file", path, e).await,
    }
}

pub(super) async fn read_file(ctx: &SandboxContext, path: &str) -> StepResult {
    ctx.log().info(format!("Reading file: {path}")).await;

    let target = match ctx.resolve(path).await {
        Ok(p) => p,
        Err(e) => return refuse(ctx, "read_file", path, e).await,
    };
    match tokio::fs::read_to_string(&target).await {
        Ok(content) => {
            ctx.log().info(format!("File content:\n{content}")).await;
            StepResult::succeeded("read_file", content)
        }
        Err(e) => io_failure(ctx, "read_file", path, e).await,
    }
}

async fn refuse(
    ctx: &SandboxContext,
    tool: &str,
    path: &str,
    err: crate::error::PathError,
) -> StepResult {
    let msg = format!("Refusing path {path:?}: {err}");
    ctx.log().error(&msg).await;
    StepResult::failed(tool, msg)
}

async fn io_failure(ctx: &SandboxContext, tool: &str, path: &str, err: std::io::Error) -> StepResult {
    let msg = format!("Error accessing {path}: {err}");
    ctx.log().error(&msg).await;
    StepResult::failed(tool, msg)
}
