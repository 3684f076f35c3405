use std::process::exit;

fn main() {
    // printed directly so a narrow RUST_LOG cannot hide why the run failed
    if let Err(error) = treesmith::cli::run() {
        eprintln!("error: {error:#}");
        exit(1);
    }
}
