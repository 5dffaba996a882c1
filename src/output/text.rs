use crate::models::{Goal, Summary, Task, WeeklyData};
use crate::store::StoreEvent;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn print_task(t: &Task) {
    let mark = if t.completed { "x" } else { " " };
    println!("  [{mark}] {} ({})", t.title, short_id(&t.id));
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        print_task(t);
    }
}

pub fn print_goal(g: &Goal) {
    println!("{}:", g.category.display_name());
    println!(
        "  Today: {}/{}{}",
        g.daily_progress,
        g.daily_target,
        if g.is_daily_goal_completed { "  (completed)" } else { "" }
    );
    println!(
        "  Week: {} day(s) completed  [{}]{}",
        g.days_completed_this_week,
        weekday_marks(&g.current_week_days_completed),
        if g.is_week_completed { "  full week!" } else { "" }
    );
    if !g.is_persisted() {
        println!("  (no goal saved yet, showing defaults)");
    }
}

pub fn print_weekly(w: &WeeklyData) {
    let days: Vec<&str> = w
        .weekdays_completed
        .iter()
        .filter_map(|d| WEEKDAYS.get(*d as usize).copied())
        .collect();
    println!(
        "Completed on {} day(s) this week: {}",
        w.weekly_streak,
        if days.is_empty() { "-".to_string() } else { days.join(", ") }
    );
}

pub fn print_summary_list(summaries: &[Summary]) {
    if summaries.is_empty() {
        println!("No summaries found.");
        return;
    }
    for s in summaries {
        println!(
            "  {} ({}) [{}] {}",
            s.title,
            short_id(&s.id),
            s.source_type.as_str(),
            s.created_at.format("%Y-%m-%d")
        );
    }
}

/// Notifications raised by the stores during a command, printed after the
/// primary output.
pub fn print_events(events: &[StoreEvent]) {
    for event in events {
        match event {
            StoreEvent::Notice { title, detail } => println!("{title}: {detail}"),
            StoreEvent::Error { title, detail } => eprintln!("{title}: {detail}"),
            StoreEvent::DailyGoalCompleted { message, .. } => println!("{message}"),
        }
    }
}

fn weekday_marks(days: &std::collections::BTreeSet<u8>) -> String {
    (0u8..7)
        .map(|d| {
            if days.contains(&d) {
                WEEKDAYS[d as usize]
            } else {
                "."
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Ids are server-issued, so the 8-byte cut must stay boundary-safe.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
