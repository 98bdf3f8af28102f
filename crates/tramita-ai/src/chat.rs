//! Gemini chat provider — grounded answer generation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use tramita_core::{Error, Result};
use tramita_domain::ChatProvider;

const DEFAULT_SYSTEM_PROMPT: &str = r#"Eres un asistente especializado en trámites municipales.

INSTRUCCIONES IMPORTANTES:
1. SOLO responde usando información del CONTEXTO RECUPERADO proporcionado
2. Si el contexto NO contiene información relevante, indica claramente que no tienes esa información
3. NO inventes información ni uses conocimiento general
4. Cita las fuentes cuando sea posible
5. Responde en español formal pero amigable
6. Formatea tu respuesta en HTML para mejor legibilidad:
   - Usa <h3> para títulos
   - Usa <ul> y <li> para listas
   - Usa <strong> para resaltar información importante
   - Usa <p> para párrafos

TEMAS QUE MANEJAS:
- Licencias de funcionamiento (bodegas, comercio, establecimientos)
- Normativas municipales (ordenanzas, leyes, decretos)
- Formularios y procedimientos administrativos
- Requisitos, plazos, costos y pagos

Si la pregunta es sobre temas NO municipales, indica cortésmente que solo puedes ayudar con trámites municipales."#;

/// Answer generation via the Gemini `generateContent` endpoint.
pub struct GeminiChat {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiChat {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        info!("GeminiChat initialized with model: {}", model);
        Self {
            client,
            api_key: api_key.into(),
            model,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            crate::API_BASE,
            self.model,
            self.api_key
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ChatGeneration(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ChatGeneration(format!("API error {status}: {body}")));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::ChatGeneration(format!("invalid response body: {e}")))?;

        parse_answer(&parsed)
    }
}

/// Layer the final prompt: system instructions, then the conversation so
/// far, then the retrieved context, then the question.
fn build_prompt(
    query: &str,
    context: &str,
    system_prompt: Option<&str>,
    history: Option<&str>,
) -> String {
    let system_prompt = match system_prompt {
        Some(s) if !s.trim().is_empty() => s,
        _ => DEFAULT_SYSTEM_PROMPT,
    };

    let mut prompt = String::from(system_prompt);
    if let Some(history) = history.filter(|h| !h.trim().is_empty()) {
        prompt.push_str("\n\nHISTORIAL DE CONVERSACIÓN:\n");
        prompt.push_str(history);
    }
    prompt.push_str("\n\nCONTEXTO RECUPERADO:\n");
    prompt.push_str(context);
    prompt.push_str("\n\nPREGUNTA DEL USUARIO:\n");
    prompt.push_str(query);
    prompt.push_str("\n\nRESPUESTA:");
    prompt
}

/// Extract the generated text from a `generateContent` response.
fn parse_answer(response: &serde_json::Value) -> Result<String> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::ChatGeneration("response has no candidate text".into()))
}

#[async_trait]
impl ChatProvider for GeminiChat {
    async fn generate_answer(
        &self,
        query: &str,
        context: &str,
        system_prompt: Option<&str>,
        history: Option<&str>,
    ) -> Result<String> {
        let prompt = build_prompt(query, context, system_prompt, history);
        self.generate(&prompt).await
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }
}
