fn main() -> anyhow::Result<()> {
    logmerge_cli::run()
}
