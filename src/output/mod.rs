pub mod formatter;

pub use formatter::{
    format_current, format_daily, format_history_stats, format_hourly_table, format_json,
    format_report, format_score, score_bar, should_use_colors,
};
