//! Generative AI services
//!
//! Calls the generative text API to suggest packing/preparation items,
//! produce day-of weather advice, and extract event schedules from chat
//! history. The model is asked for JSON where structure is needed, but its
//! output is treated as untrusted free text: the JSON object is extracted
//! with a regex and any parse failure degrades to an empty structure
//! instead of propagating.

use std::time::Duration;

use chrono::{Datelike, FixedOffset, Utc};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::database::DatabaseService;
use crate::models::checklist::ChecklistSuggestions;
use crate::models::{ChatMessage, ChecklistItem, Event, ScheduleExtraction, ToggleChecklistRequest};
use crate::utils::errors::{GenerationError, HishoError, Result};
use crate::utils::time::today_local_midnight;

/// Locate the first JSON object in model output, preferring a fenced
/// ```json block over a bare one
fn extract_json_block(text: &str) -> Option<&str> {
    let fenced = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("static regex");
    let bare = Regex::new(r"(?s)(\{.*\})").expect("static regex");

    fenced
        .captures(text)
        .or_else(|| bare.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Extract checklist suggestions from model output. Returns empty
/// suggestions when nothing parses.
pub fn extract_suggestions(text: &str) -> ChecklistSuggestions {
    match extract_json_block(text) {
        Some(raw) => match serde_json::from_str::<ChecklistSuggestions>(raw) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "Model output did not parse as suggestions, degrading to empty");
                ChecklistSuggestions::default()
            }
        },
        None => {
            warn!("No JSON object found in model output, degrading to empty");
            ChecklistSuggestions::default()
        }
    }
}

/// Extract an event-schedule candidate from model output. Returns an empty
/// candidate when nothing parses.
pub fn extract_schedule(text: &str) -> ScheduleExtraction {
    match extract_json_block(text) {
        Some(raw) => match serde_json::from_str::<ScheduleExtraction>(raw) {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(error = %e, "Model output did not parse as a schedule, degrading to empty");
                ScheduleExtraction::default()
            }
        },
        None => {
            warn!("No JSON object found in model output, degrading to empty");
            ScheduleExtraction::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Client for the generative text API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("hisho-backend/0.1")
            .build()
            .map_err(HishoError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_contents(json!([{ "parts": [{ "text": prompt }] }]))
            .await
    }

    async fn generate_with_contents(&self, contents: serde_json::Value) -> Result<String> {
        let url = format!(
            "{}/v1beta/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let payload = json!({ "contents": contents });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(GenerationError::RequestFailed(response.status().to_string()).into());
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(text)
    }

    /// Ask for packing suggestions for an event, split into required and
    /// optional, each with a lead time in days
    pub async fn suggest_checklist(
        &self,
        event: &Event,
        existing_items: &[String],
    ) -> Result<ChecklistSuggestions> {
        let instruction = if existing_items.is_empty() {
            "必要な持ち物を『必須』と『任意』に分けて教えてください。".to_string()
        } else {
            let joined: Vec<String> = existing_items.iter().map(|i| format!("- {i}")).collect();
            format!(
                "以下の持ち物はすでに考慮済みです。それ以外に必要と思われるものを『必須』と『任意』に分けて提案してください。\n（既出の持ち物は絶対に含めないでください）\n\n【すでにある持ち物】\n{}",
                joined.join("\n")
            )
        };

        let weather_section = match &event.weather_info {
            Some(info) => format!(
                "また、次のような天気予報情報があります。持ち物の判断に考慮してください：\n{info}\n"
            ),
            None => String::new(),
        };

        let prompt = format!(
            r#"次のスケジュールに向けて、{instruction}
{weather_section}
それぞれの持ち物について、何日前から準備すべきかも整数で指定してください。

出力はJSON形式のみでお願いします（説明文なし）:
{{
  "required": [
    {{ "item": "持ち物名", "prepare_before": 日数 }}
  ],
  "optional": [
    {{ "item": "持ち物名", "prepare_before": 日数 }}
  ]
}}

日時: {start}
場所: {location}
内容: {title}
"#,
            start = event.start_time.to_rfc3339(),
            location = event.location.as_deref().unwrap_or(""),
            title = event.title,
        );

        let text = self.generate(&prompt).await?;
        Ok(extract_suggestions(&text))
    }

    /// Best-effort address inference used when an event is created without
    /// one. Returns None on any failure; never blocks event creation.
    pub async fn infer_address(&self, title: &str, location: &str) -> Option<String> {
        let prompt = format!(
            "次の予定の開催場所から、郵送可能な住所を1行で推定してください。推定できない場合は「不明」とだけ答えてください。\n\nタイトル: {title}\n場所: {location}"
        );

        match self.generate(&prompt).await {
            Ok(text) => {
                let line = text.lines().next().unwrap_or("").trim().to_string();
                if line.is_empty() || line == "不明" {
                    None
                } else {
                    Some(line)
                }
            }
            Err(e) => {
                warn!(error = %e, "Address inference failed");
                None
            }
        }
    }

    /// Generate 2-3 sentences of day-of advice from the event's stored
    /// weather summary. The caller decides whether the event qualifies.
    pub async fn weather_advice(&self, event: &Event) -> Result<String> {
        let prompt = format!(
            "あなたは予定プランナーです。\
             次のスケジュールと天気情報を考慮して、当日を楽しめるよう日本語で2〜3文程度のアドバイスを作成してください。\n\
             【スケジュール情報】\n{title}\n\
             【天気情報】\n{weather}\n\
             【場所】\n{location}\n\
             【開始時間】\n{start}\n\
             【終了時間】\n{end}\n\
             【出力例】\n・雨が強すぎるので、水族館や映画館に行くのはいかがでしょうか。\n\
             ・絶好の動物園日和ですね。日焼け対策と水分補給を忘れずに。\n\
             ・雨の可能性が高いので、降りだしたら近くの〇〇カフェで雨宿りするのがおすすめです。\n",
            title = event.title,
            weather = event.weather_info.as_deref().unwrap_or(""),
            location = event.location.as_deref().unwrap_or(""),
            start = event.start_time.to_rfc3339(),
            end = event.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        );

        let text = self.generate(&prompt).await?;
        let advice = text.trim();
        if advice.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        Ok(advice.to_string())
    }

    /// Extract an event candidate (title, start/end, location) from a chat
    /// history. The instruction pins "today" in the service timezone so
    /// relative dates in the conversation resolve correctly.
    pub async fn extract_event_schedule(
        &self,
        messages: &[ChatMessage],
        timezone_offset_hours: i32,
    ) -> Result<ScheduleExtraction> {
        let offset = FixedOffset::east_opt(timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        let now = Utc::now().with_timezone(&offset);
        let weekday = ["月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日", "日曜日"]
            [now.weekday().num_days_from_monday() as usize];

        let instruction = format!(
            r#"今日は {today}（{weekday}）です。

以下は人間同士のチャット履歴です。この会話の中で、予定されているイベントがある場合は、以下の情報を抽出してください：

- イベントのタイトル（自然な日本語で簡潔に）
- 開始日時（ISO 8601形式で）
- 終了日時（ISO 8601形式で）
- 場所（できるだけ具体的に）

【出力形式】
※以下はあくまで構造の例です。日付や時刻は、会話の内容に基づいて正しく推論してください。説明文や補足は一切不要です。必ず次のようなJSONのみを返してください：

{{
  "title": "イベントのタイトル",
  "start_time": "2025-06-01T09:00:00+09:00",
  "end_time": "2025-06-01T14:00:00+09:00",
  "location": "イベントの場所"
}}
"#,
            today = now.format("%Y-%m-%d"),
        );

        let mut contents = vec![json!({ "role": "user", "parts": [{ "text": instruction }] })];
        for message in messages {
            contents.push(json!({ "role": message.role, "parts": [{ "text": message.text }] }));
        }

        let text = self
            .generate_with_contents(serde_json::Value::Array(contents))
            .await?;
        Ok(extract_schedule(&text))
    }
}

/// Weather-advice refresh: regenerates the stored day-of advice for events
/// that already carry a weather summary. Shares the 0/2/4-day cadence with
/// the forecast refresh so advice follows the latest summary.
#[derive(Clone)]
pub struct AdviceService {
    db: DatabaseService,
    gemini: GeminiClient,
}

impl AdviceService {
    pub fn new(db: DatabaseService, gemini: GeminiClient) -> Self {
        Self { db, gemini }
    }

    /// Regenerate advice for one event. Events without a weather summary
    /// are skipped. Returns whether advice was stored.
    pub async fn refresh_event(&self, user_id: &str, event_id: Uuid) -> Result<bool> {
        let event = self.db.require_event(user_id, event_id).await?;
        self.refresh(&event).await
    }

    async fn refresh(&self, event: &Event) -> Result<bool> {
        if event.weather_info.as_deref().map_or(true, str::is_empty) {
            return Ok(false);
        }

        let advice = self.gemini.weather_advice(event).await?;
        self.db.events.set_advice(event.id, &advice).await?;

        info!(event_id = %event.id, "Weather advice stored");
        Ok(true)
    }

    /// Advice pass over events starting 0, 2 and 4 days from now. One
    /// event's failure never aborts the pass.
    pub async fn refresh_upcoming(&self, timezone_offset_hours: i32) -> Result<u32> {
        let today = today_local_midnight(timezone_offset_hours);
        let mut updated = 0u32;

        for offset_days in [0i64, 2, 4] {
            let day_start = today + chrono::Duration::days(offset_days);
            let day_end = day_start + chrono::Duration::days(1);

            let events = self.db.events.starting_on_day(day_start, day_end).await?;
            for event in &events {
                match self.refresh(event).await {
                    Ok(true) => updated += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(event_id = %event.id, error = %e, "Advice generation failed");
                    }
                }
            }
        }

        Ok(updated)
    }
}

/// Checklist operations: toggling items and generating new ones, each
/// followed by a due-date recomputation over a fresh read of unchecked items
#[derive(Clone)]
pub struct ChecklistService {
    db: DatabaseService,
    gemini: GeminiClient,
}

impl ChecklistService {
    pub fn new(db: DatabaseService, gemini: GeminiClient) -> Self {
        Self { db, gemini }
    }

    /// Toggle one item's checked flag and recompute the event's due date.
    /// Returns the item and the new due date.
    pub async fn toggle_item(
        &self,
        user_id: &str,
        request: ToggleChecklistRequest,
    ) -> Result<(ChecklistItem, Option<chrono::DateTime<chrono::Utc>>)> {
        let event = self.db.require_event(user_id, request.event_id).await?;

        let item = self
            .db
            .checklists
            .set_checked(request.event_id, request.checklist_id, request.checked)
            .await?
            .ok_or(HishoError::ChecklistItemNotFound {
                item_id: request.checklist_id,
            })?;

        info!(event_id = %event.id, item_id = %item.id, checked = item.checked, "Checklist item toggled");

        let due = self.db.recompute_due_date(&event).await?;
        Ok((item, due))
    }

    /// Generate new checklist items for an event and recompute its due date.
    /// Existing item names are passed to the model so suggestions do not
    /// repeat them. An empty suggestion set is a valid, quiet outcome.
    pub async fn generate_for_event(
        &self,
        user_id: &str,
        event_id: Uuid,
    ) -> Result<ChecklistSuggestions> {
        let event = self.db.require_event(user_id, event_id).await?;

        let existing: Vec<String> = self
            .db
            .checklists
            .list_for_event(event_id)
            .await?
            .into_iter()
            .map(|item| item.item)
            .collect();

        let suggestions = self.gemini.suggest_checklist(&event, &existing).await?;
        if suggestions.is_empty() {
            info!(event_id = %event_id, "Generation produced no new items");
            return Ok(suggestions);
        }

        self.db
            .checklists
            .insert_suggested(event_id, &suggestions.required, true)
            .await?;
        self.db
            .checklists
            .insert_suggested(event_id, &suggestions.optional, false)
            .await?;

        info!(
            event_id = %event_id,
            required = suggestions.required.len(),
            optional = suggestions.optional.len(),
            "Generated checklist items"
        );

        self.db.recompute_due_date(&event).await?;
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checklist::SuggestedItem;

    #[test]
    fn test_extract_from_fenced_block() {
        let text = "はい、こちらです。\n```json\n{\"required\": [{\"item\": \"パスポート\", \"prepare_before\": 7}], \"optional\": []}\n```\n以上です。";
        let suggestions = extract_suggestions(text);
        assert_eq!(
            suggestions.required,
            vec![SuggestedItem {
                item: "パスポート".to_string(),
                prepare_before: 7
            }]
        );
        assert!(suggestions.optional.is_empty());
    }

    #[test]
    fn test_extract_from_bare_object() {
        let text = "{\"required\": [], \"optional\": [{\"item\": \"傘\", \"prepare_before\": 0}]}";
        let suggestions = extract_suggestions(text);
        assert_eq!(suggestions.optional.len(), 1);
        assert_eq!(suggestions.optional[0].item, "傘");
    }

    #[test]
    fn test_missing_prepare_before_defaults_to_zero() {
        let text = "{\"required\": [{\"item\": \"財布\"}], \"optional\": []}";
        let suggestions = extract_suggestions(text);
        assert_eq!(suggestions.required[0].prepare_before, 0);
    }

    #[test]
    fn test_garbage_degrades_to_empty() {
        assert!(extract_suggestions("申し訳ありません、わかりません。").is_empty());
        assert!(extract_suggestions("```json\n{broken\n```").is_empty());
        assert!(extract_suggestions("").is_empty());
    }

    #[test]
    fn test_extract_schedule_from_fenced_block() {
        let text = "```json\n{\"title\": \"花見\", \"start_time\": \"2026-04-01T10:00:00+09:00\", \"end_time\": \"2026-04-01T15:00:00+09:00\", \"location\": \"上野公園\"}\n```";
        let schedule = extract_schedule(text);
        assert_eq!(schedule.title.as_deref(), Some("花見"));
        assert_eq!(
            schedule.start_time.as_deref(),
            Some("2026-04-01T10:00:00+09:00")
        );
        assert_eq!(schedule.location.as_deref(), Some("上野公園"));
    }

    #[test]
    fn test_extract_schedule_tolerates_missing_fields() {
        let schedule = extract_schedule("{\"title\": \"ランチ\"}");
        assert_eq!(schedule.title.as_deref(), Some("ランチ"));
        assert!(schedule.start_time.is_none());
        assert!(schedule.end_time.is_none());
        assert!(schedule.location.is_none());
    }

    #[test]
    fn test_extract_schedule_degrades_to_empty_on_prose() {
        assert!(extract_schedule("予定は見つかりませんでした。").is_empty());
        assert!(extract_schedule("").is_empty());
    }
}
