fn main() {
    if let Err(err) = sippschaft_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
