use clap::{Parser, Subcommand};

mod handlers;

pub use handlers::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse activity text and print the result
    Parse {
        /// Activity text, e.g. "write report #work !2"
        #[clap(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Log an activity
    Log {
        #[clap(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,

        /// How long it took, in minutes
        #[clap(short, long)]
        duration: Option<u32>,

        /// Ask how focused you were afterwards
        #[clap(short = 'f', long, default_value = "false")]
        ask_focus: bool,
    },

    /// Show suggestions for a query
    Suggest {
        /// Empty to get the initial suggestions. Start with # to search tags.
        query: Option<String>,

        /// Suggestion server address. Overrides TEMPO_ADDR and the config.
        #[clap(short, long)]
        remote: Option<String>,

        /// Move the selection down this many times
        #[clap(short, long, default_value = "0")]
        next: usize,
    },

    /// Complete activity text with a suggestion
    Complete {
        #[clap(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,

        /// Which suggestion to apply
        #[clap(short, long, default_value = "0")]
        pick: usize,

        #[clap(short, long)]
        remote: Option<String>,
    },

    /// List tags with how often they were used
    Tags {},
}
