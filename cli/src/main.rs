use anyhow::Result;

fn main() -> Result<()> {
    trine_cli::run()
}
