use serde_json::{json, Value};

use crate::error::StudyError;
use crate::models::{Goal, Summary, Task, User, WeeklyData};
use crate::store::StoreEvent;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn success_with_events(data: Value, events: &[StoreEvent]) -> Value {
    json!({
        "success": true,
        "data": data,
        "events": events.iter().map(event_json).collect::<Vec<_>>()
    })
}

pub fn error(err: &StudyError) -> Value {
    let mut body = json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    });
    if let Some(retry_after) = err.retry_after {
        body["error"]["retry_after"] = json!(retry_after);
    }
    body
}

pub fn event_json(event: &StoreEvent) -> Value {
    match event {
        StoreEvent::Notice { title, detail } => json!({
            "kind": "notice",
            "title": title,
            "detail": detail
        }),
        StoreEvent::Error { title, detail } => json!({
            "kind": "error",
            "title": title,
            "detail": detail
        }),
        StoreEvent::DailyGoalCompleted { category, message } => json!({
            "kind": "daily_goal_completed",
            "category": category.as_str(),
            "message": message
        }),
    }
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "completed": t.completed,
        "category": t.category.as_str(),
        "created_at": t.created_at.to_rfc3339(),
        "updated_at": t.updated_at.to_rfc3339()
    })
}

pub fn goal_json(g: &Goal) -> Value {
    json!({
        "id": g.id,
        "category": g.category.as_str(),
        "daily_target": g.daily_target,
        "daily_progress": g.daily_progress,
        "is_daily_goal_completed": g.is_daily_goal_completed,
        "weekly_streak": g.weekly_streak,
        "current_week_days_completed": g.current_week_days_completed,
        "days_completed_this_week": g.days_completed_this_week,
        "is_week_completed": g.is_week_completed
    })
}

pub fn weekly_json(w: &WeeklyData) -> Value {
    json!({
        "weekly_streak": w.weekly_streak,
        "weekdays_completed": w.weekdays_completed
    })
}

pub fn summary_json(s: &Summary) -> Value {
    json!({
        "id": s.id,
        "title": s.title,
        "source_type": s.source_type.as_str(),
        "created_at": s.created_at.to_rfc3339()
    })
}

pub fn user_json(u: &User) -> Value {
    json!({
        "email": u.email,
        "username": u.username
    })
}
