use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Turn a free-text request into a study packet PDF.
    Create(CreateArgs),
    /// Build a packet for a topic that is already broken down.
    Packet(PacketArgs),
    /// Run the markup sanitizer over a file.
    Sanitize(SanitizeArgs),
    /// List recorded packets.
    List(ListArgs),
    /// Mark a recorded packet public or private.
    Visibility(VisibilityArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// What the student wants to learn, in their own words.
    #[arg(long)]
    pub prompt: String,

    /// Target audience, e.g. "high school" or "undergraduate".
    #[arg(long)]
    pub grade_level: String,

    /// Number of practice problems to source.
    #[arg(long, default_value_t = 5)]
    pub problems: usize,

    /// Rough number of subtopics to ask for.
    #[arg(long)]
    pub subtopics_hint: Option<usize>,

    /// Directory for rendered packets and the packet library.
    #[arg(long, default_value = "packets")]
    pub out_dir: String,

    /// Record the packet as public.
    #[arg(long, default_value_t = false)]
    pub public: bool,
}

#[derive(Debug, Args)]
pub struct PacketArgs {
    /// Main topic.
    #[arg(long)]
    pub topic: String,

    /// Subtopic, in learning order (repeatable).
    #[arg(long = "subtopic")]
    pub subtopics: Vec<String>,

    #[arg(long)]
    pub grade_level: String,

    /// Number of practice problems to source.
    #[arg(long, default_value_t = 5)]
    pub problems: usize,

    /// Directory for rendered packets.
    #[arg(long, default_value = "packets")]
    pub out_dir: String,
}

#[derive(Debug, Args)]
pub struct SanitizeArgs {
    /// Markdown file to sanitize.
    #[arg(long)]
    pub input: String,

    /// Output path.
    #[arg(long)]
    pub out: String,

    /// Treat the input as one problem or solution (also strips numbering).
    #[arg(long, default_value_t = false)]
    pub item: bool,

    /// Overwrite the output if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Packet library directory.
    #[arg(long, default_value = "packets")]
    pub out_dir: String,

    /// Only show public packets.
    #[arg(long, default_value_t = false)]
    pub public: bool,
}

#[derive(Debug, Args)]
pub struct VisibilityArgs {
    /// Packet library directory.
    #[arg(long, default_value = "packets")]
    pub out_dir: String,

    /// Packet id as printed by `list`.
    #[arg(long)]
    pub id: String,

    /// New visibility.
    #[arg(long, action = ArgAction::Set)]
    pub public: bool,
}
