use ptokeeper::Cli;

fn main() {
    if let Err(err) = Cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
