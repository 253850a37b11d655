/*!
 * Subtitle serialization.
 *
 * - `timestamp`: ASS time values and human-readable durations
 * - `ass`: style table, escaping and file rendering
 */

pub use self::ass::{
    escape_text, render, render_with_options, write_ass, AssOptions, SpeakerStyleTable,
};
pub use self::timestamp::{format_duration, parse_timestamp, to_timestamp};

pub mod ass;
pub mod timestamp;
