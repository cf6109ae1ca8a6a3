use clap::{Args, Parser, Subcommand, ValueEnum};
use shelf_core::entities::TaskKind;
use shelf_imaging::DEFAULT_QUALITY;

#[derive(Parser)]
#[command(name = "shelf", version, about = "Download Immich albums and letterbox them for photo frames")]
pub struct Cli {
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the Immich connection and API key.
    Ping,
    /// List remote albums with their locally downloaded counts.
    Albums,
    /// List albums with a downloaded archive.
    Downloads,
    /// Download the images of an album not yet fetched, optionally resizing them.
    Download(DownloadArgs),
    /// Letterbox a downloaded album with a resize profile.
    Resize(ResizeArgs),
    /// Manage resize profiles.
    #[command(subcommand)]
    Profiles(ProfileCommand),
    /// List recent tasks, newest first.
    Tasks(TasksArgs),
    /// Delete a finished task and its output archive.
    DeleteTask { task_id: String },
}

#[derive(Args)]
pub struct DownloadArgs {
    pub album_id: String,
    /// Name stored with the archive; defaults to the remote album name.
    #[arg(long)]
    pub name: Option<String>,
    /// Resize profiles to apply to the new archive once the download completes.
    #[arg(long = "resize", value_name = "PROFILE_ID", num_args = 1..)]
    pub resize: Vec<i64>,
}

#[derive(Args)]
pub struct ResizeArgs {
    pub album_id: String,
    pub profile_id: i64,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    List,
    Add(ProfileArgs),
    Update {
        id: i64,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args)]
pub struct ProfileArgs {
    pub name: String,
    #[arg(long)]
    pub width: u32,
    #[arg(long)]
    pub height: u32,
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,
    /// Skip sources that are wider than tall (or square).
    #[arg(long)]
    pub no_landscape: bool,
    /// Skip sources that are taller than wide.
    #[arg(long)]
    pub no_portrait: bool,
}

#[derive(Args)]
pub struct TasksArgs {
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Download,
    Resize,
}

impl From<KindArg> for TaskKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Download => TaskKind::Download,
            KindArg::Resize => TaskKind::Resize,
        }
    }
}
