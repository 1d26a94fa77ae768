fn main() -> anyhow::Result<()> {
    let command_line_interface = abnf_typegen::cli::CommandLineInterface::load();
    command_line_interface.run()
}
