use anyhow::Result;

fn main() -> Result<()> {
    aocgen::cli::run()
}
