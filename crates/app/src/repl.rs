use clap::{Parser, Subcommand};
use songbook_core::{PlaylistId, SongId};

#[derive(Parser, Debug)]
#[command(name = "songbook", no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

/// One line typed at the prompt.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// List every song
    Songs,
    /// Search songs by title; without a term lists every song
    Search { term: Vec<String> },
    /// Play a song from the list on screen
    Play { id: SongId },
    /// Next song in the current list
    #[command(alias = "n")]
    Next,
    /// Previous song in the current list
    #[command(alias = "previous")]
    Prev,
    /// Pause or resume
    #[command(alias = "pause")]
    Toggle,
    /// Jump to a position, in percent of the song
    Seek {
        #[arg(allow_negative_numbers = true)]
        percent: f64,
    },
    /// Stop and forget the current list
    Stop,
    /// Show what is playing
    Status,
    /// Add a song to the catalog
    AddSong {
        title: String,
        artist: String,
        album: String,
        /// Length in seconds
        duration: String,
    },
    /// Remove a song from the catalog
    DeleteSong { id: SongId },
    /// List your playlists
    Playlists,
    /// Show a playlist and start playing it
    Open { id: PlaylistId },
    /// Create a playlist
    Create {
        name: String,
        description: Option<String>,
    },
    /// Rename a playlist or change its description
    Rename {
        id: PlaylistId,
        name: String,
        description: Option<String>,
    },
    /// Delete a playlist
    Delete { id: PlaylistId },
    /// Append a song to a playlist
    AddTo { playlist: PlaylistId, song: SongId },
    /// Remove a song from a playlist
    RemoveFrom { playlist: PlaylistId, song: SongId },
    /// Leave songbook
    #[command(alias = "exit")]
    Quit,
}

/// Parses a prompt line. `Ok(None)` for blank input; `Err` carries text for
/// the user, including help output.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let words = split_words(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    ReplLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|err| err.render().to_string())
}

/// Whitespace split that keeps single- or double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
