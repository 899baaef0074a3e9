fn main() -> anyhow::Result<()> {
    noir_cli::main()
}
