mod app;
mod cli;
mod control_loop;
mod panel;
mod run_log;
mod status;
mod switch;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
