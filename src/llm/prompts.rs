use crate::models::WorkoutCategory;

const WORKOUT_TEXT_PROMPT: &str = r#"You are a fitness expert that analyzes workout descriptions. Extract workout information and return it as a JSON object with this structure:
{
  "workout_session": {
    "category": "push|pull|legs|abs|cardio|treadmill",
    "duration_minutes": number,
    "notes": "string"
  },
  "exercises": [
    {
      "exercise_name": "string",
      "exercise_type": "strength|cardio",
      "sets": number,
      "reps": number,
      "weight_kg": number,
      "exercise_sets": [
        { "set_number": number, "reps": number, "weight_kg": number }
      ],
      "distance_km": number,
      "time_minutes": number,
      "laps": number,
      "notes": "string"
    }
  ]
}

Rules:
- Infer the workout category from the exercises if it is not provided
- Extract sets, reps, weights, distances and times from the text
- Use null for missing values
- Accept any common notation ("3x12", "3 sets of 12", ...)
- When weights or reps differ between sets, list every set in exercise_sets, numbered from 1
- When every set is the same, fill sets, reps and weight_kg and leave exercise_sets empty
- Estimate the duration if it is not stated
- Return ONLY valid JSON, no other text"#;

pub const WORKOUT_PLAN_SYSTEM_PROMPT: &str = r#"You are a fitness expert that analyzes workout plans from PDFs. Extract workout information and return it as a JSON array. Each workout should include:
- date (YYYY-MM-DD; when the plan has no specific dates, schedule from next Monday onwards)
- category (one of: "push", "pull", "legs", "abs", "cardio", "treadmill")
- duration_minutes (estimate if not specified)
- notes (any additional workout notes)
- exercises (array of objects with: exercise_name, exercise_type ("strength" or "cardio"), sets, reps, weight_kg, distance_km, time_minutes, laps, notes)

Build a realistic weekly schedule from the content. Return ONLY valid JSON, no other text."#;

pub const WORKOUT_PLAN_USER_PROMPT: &str =
    "Please analyze this workout plan PDF and extract all workout sessions and exercises. Create a structured workout schedule.";

pub const CONNECTION_TEST_PROMPT: &str = r#"Say "API connection successful" in JSON format: {"status": "success", "message": "API connection successful"}"#;

/// Prompt for turning a free-text workout description into JSON. A category
/// hint is appended unless the user left it on automatic.
pub fn workout_text_prompt(workout_text: &str, category_hint: Option<WorkoutCategory>) -> String {
    let mut prompt = format!(
        "{}\n\nParse this workout description: \"{}\"",
        WORKOUT_TEXT_PROMPT, workout_text
    );
    if let Some(category) = category_hint {
        prompt.push_str(&format!(" Category hint: {}", category));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text_and_hint() {
        let prompt = workout_text_prompt("bench 3x8 60kg", Some(WorkoutCategory::Push));
        assert!(prompt.contains("\"bench 3x8 60kg\""));
        assert!(prompt.ends_with("Category hint: push"));
    }

    #[test]
    fn test_prompt_without_hint() {
        let prompt = workout_text_prompt("ran 5k", None);
        assert!(!prompt.contains("Category hint"));
    }
}
