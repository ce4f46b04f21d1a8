//! Prompt templates for the advisory model.
//!
//! The dosage prompt pins the exact layout `parse` expects — `<amount> g/m²`
//! per fertilizer, `Reason:` lines, one `Additional Tips:` line. Loosening
//! the wording here without adjusting the parser leaves the model path in
//! permanent fallback.

/// Prompt for an NPK dosage recommendation.
pub fn dosage_prompt(ph: f64, nitrogen: f64, potassium: f64, context: Option<&str>) -> String {
    let context_line = match context {
        Some(c) if !c.trim().is_empty() => format!("- Additional context: {}\n", c.trim()),
        _ => String::new(),
    };

    format!(
        "You are an experienced agronomist giving NPK fertilizer recommendations.\n\
         Given the following soil data:\n\
         - Soil pH: {ph}\n\
         - Nitrogen content (N): {nitrogen}\n\
         - Potassium content (K): {potassium}\n\
         {context_line}\n\
         Recommend NPK fertilizer doses (Urea, SP-36, KCL) in grams per square meter (g/m²).\n\
         Also give a short reason for each recommendation.\n\n\
         Response format:\n\
         1. Urea (N): [amount] g/m²\n   \
         Reason: [short explanation]\n\
         2. SP-36 (P): [amount] g/m²\n   \
         Reason: [short explanation]\n\
         3. KCL (K): [amount] g/m²\n   \
         Reason: [short explanation]\n\n\
         Additional Tips: [short advice for crop care]\n\n\
         Detailed Analysis: [one paragraph on the soil condition and the recommendation]"
    )
}

/// Prompt for extracting pH / N / K from a free-text soil description.
pub fn analysis_prompt(text: &str) -> String {
    format!(
        "Analyze the following soil data and extract the pH, Nitrogen (N), and \
         Potassium (K) values:\n\n\
         Data: {text}\n\n\
         Respond with a JSON object in this format:\n\
         {{\n\
         \x20 \"pH\": [numeric value],\n\
         \x20 \"N\": [numeric value],\n\
         \x20 \"K\": [numeric value],\n\
         \x20 \"analysis\": \"short assessment of the soil condition\"\n\
         }}"
    )
}
