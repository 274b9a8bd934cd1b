//! The scripted conversation sent to the chat model.
//!
//! The script is fixed: only the recognised label text changes between
//! requests. It reads as a short dialogue in Chinese (the labels it targets
//! are Chinese nutrition facts tables) and asks the model to
//!
//! 1. normalise energy, protein, fat, carbohydrate and sodium to per-100g or
//!    per-100mL values,
//! 2. classify the food as low-sugar / high-protein / low-fat using the
//!    thresholds below,
//! 3. give fitness advice,
//! 4. answer in Markdown.

use crate::pipeline::analyze::ChatMessage;

/// Opening request.
pub const OPENING_REQUEST: &str = "请你对这个食物营养分析";

/// Scripted assistant reply asking for the table.
pub const ASK_FOR_TABLE: &str = "当然，请你告诉我这个食物的营养成分表";

/// Per-100g / per-100mL normalisation instruction.
pub const NORMALIZE_INSTRUCTION: &str = "这是一些信息，其中包含了这个食物的营养成分表,请你根据其数据计算每一百克或每一百毫升有多少能量、蛋白质、脂肪、碳水化合物和钠";

/// Prefix placed directly before the recognised table text.
pub const TABLE_PREFIX: &str = "这是这个食物的营养成分表";

/// Scripted assistant acknowledgement.
pub const ACKNOWLEDGE: &str = "好的";

/// Classification thresholds.
///
/// Low-sugar: carbohydrate ≤5g/100g or ≤5g/100mL.
/// High-protein: protein ≥12g/100g or ≥6g/100mL.
/// Low-fat: fat ≤3g/100g or ≤1.5g/100mL.
pub const CLASSIFY_INSTRUCTION: &str = "然后请你根据这些数据，判断这个食品是不是低糖食品、高蛋白食品和低脂食品。低糖食品的定义是碳水化合物含量需≤5g/100g 或 ≤5g/100mL，高蛋白食品的定义是蛋白质含量需≥12g/100g 或 ≥6g/100mL，低脂肪食品的定义是≤3g/100g 或 ≤1.5g/100mL";

/// Fitness advice + Markdown output instruction.
pub const ADVICE_INSTRUCTION: &str = "并请你提供对应的健身建议. 请用 MarkDown 样式输出信息";

/// Build the full conversation for one label.
pub fn nutrition_conversation(nutrition_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user(OPENING_REQUEST),
        ChatMessage::assistant(ASK_FOR_TABLE),
        ChatMessage::user(NORMALIZE_INSTRUCTION),
        ChatMessage::user(format!("{TABLE_PREFIX}{nutrition_text}")),
        ChatMessage::assistant(ACKNOWLEDGE),
        ChatMessage::user(CLASSIFY_INSTRUCTION),
        ChatMessage::user(ADVICE_INSTRUCTION),
    ]
}
