fn main() {
    if let Err(err) = dataset_fixture::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
