fn main() {
    if let Err(err) = table2sql::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
