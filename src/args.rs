use clap::Parser;

/// Tabulation program for Hare-Clark single transferable vote elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the election: the positions, their candidates
    /// and their ballots. See the manual of the hare_clark crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, hctab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified in the --config file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A CSV file with one ballot per row, for a single position. Ignored if --config is provided.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (number) The number of seats to fill. Required with --input.
    #[clap(long, value_parser)]
    pub vacancies: Option<u32>,

    /// (list of comma-separated values or not specified) The candidates of the --input file, in roster order.
    /// By default, the candidates are the ones found in the file, in order of appearance.
    #[clap(long, value_parser, use_value_delimiter = true, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,

    /// (report, useCandidateOrder or random) How to resolve a tie at the end of the count. Overrides the rules of the
    /// --config file.
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// (number) The seed for the random tiebreak mode.
    #[clap(long, value_parser)]
    pub seed: Option<u32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
