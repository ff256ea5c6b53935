use clap::Parser;

/// This program consolidates the free-text answers of a survey and ranks them.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration describing the survey sources and the rules.
    /// For more information about the file format, read the manual of the survey_ranking crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected summary in JSON format. If provided,
    /// surveyrank will check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the file containing the answers. Setting this option
    /// overrides the sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json, csv or forms.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (list of values or not specified) For the forms input, the titles of the columns
    /// that contain the questions to process. All the columns are processed otherwise.
    #[clap(long, value_parser)]
    pub questions: Option<Vec<String>>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default 0.75) The minimum similarity between two answers for them to be merged.
    #[clap(long, value_parser)]
    pub similarity_threshold: Option<f64>,

    /// (default 100,80,60,40,20) The points given to the first ranks, separated by commas.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub score_tiers: Option<Vec<u32>>,

    /// If passed as an argument, only the input questions with enough correct answers
    /// are written, with their correct answers only.
    #[clap(long, takes_value = false)]
    pub final_export: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
