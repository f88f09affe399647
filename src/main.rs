fn main() {
    colocgraph::cli::run();
}
