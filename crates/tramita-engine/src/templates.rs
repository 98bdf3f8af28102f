//! Canned responses and the special-command phrase sets.
//!
//! Matching order is load-bearing: the general-help keyword set is broad
//! enough to shadow every other category, so it must be checked last.

use tramita_domain::QueryResult;

/// Phrases asking how to use the RAG itself. Checked before general help.
const RAG_HELP_PHRASES: [&str; 2] = ["ayuda con el rag", "cómo preguntar"];

/// Phrases asking for the FAQ.
const FAQ_PHRASES: [&str; 2] = ["faq", "preguntas frecuentes"];

/// Phrases asking which topics are covered.
const TOPIC_PHRASES: [&str; 2] = ["temas disponibles", "qué temas"];

/// Broad help keyword set. Checked last.
const HELP_KEYWORDS: [&str; 14] = [
    "ayuda",
    "ayúdame",
    "qué puedes hacer",
    "que puedes hacer",
    "qué temas",
    "que temas",
    "sobre qué",
    "sobre que",
    "de qué",
    "de que",
    "help",
    "opciones",
    "menú",
    "menu",
];

/// Check a query against the special-command phrase sets, in priority
/// order. On a match returns the canned response; retrieval and generation
/// are skipped entirely.
pub fn intercept(query: &str) -> Option<QueryResult> {
    let query_lower = query.to_lowercase();
    let query_lower = query_lower.trim();

    if RAG_HELP_PHRASES.iter().any(|p| query_lower.contains(p)) {
        return Some(canned(query, RAG_HELP_MESSAGE, "Guía Técnica RAG"));
    }

    if FAQ_PHRASES.iter().any(|p| query_lower.contains(p)) {
        return Some(canned(query, FAQ_MESSAGE, "Preguntas Frecuentes"));
    }

    if TOPIC_PHRASES.iter().any(|p| query_lower.contains(p)) {
        return Some(canned(query, TOPICS_MESSAGE, "Temas Disponibles"));
    }

    if HELP_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        return Some(canned(query, HELP_MESSAGE, "Sistema de Ayuda"));
    }

    None
}

fn canned(query: &str, answer: &str, document_name: &str) -> QueryResult {
    QueryResult {
        query: query.to_string(),
        answer: answer.to_string(),
        sources: Vec::new(),
        similar_chunks: Vec::new(),
        document_name: Some(document_name.to_string()),
        download_url: None,
    }
}

/// General help menu.
pub const HELP_MESSAGE: &str = r#"
<div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 20px; border-radius: 10px; color: white; margin-bottom: 15px;">
    <h2 style="margin: 0 0 10px 0; font-size: 24px;">Asistente de Trámites Municipales</h2>
    <p style="margin: 0; opacity: 0.9;">Tu guía inteligente para procedimientos del municipio</p>
</div>

<p><strong>📋 CONSULTAS FRECUENTES</strong></p>
<p>Haz clic o escribe una de estas opciones para obtener ayuda rápida:</p>

<div style="display: grid; gap: 10px; margin: 15px 0;">
    <div style="background: #f0f9ff; padding: 12px; border-radius: 8px; border-left: 4px solid #3b82f6;">
        <strong>1️⃣ Preguntas Frecuentes</strong><br/>
        <em style="color: #64748b;">Consultas más comunes sobre trámites</em>
    </div>

    <div style="background: #fef3c7; padding: 12px; border-radius: 8px; border-left: 4px solid #f59e0b;">
        <strong>2️⃣ Ayuda con el RAG</strong><br/>
        <em style="color: #64748b;">Aprende a hacer mejores preguntas</em>
    </div>

    <div style="background: #f0fdf4; padding: 12px; border-radius: 8px; border-left: 4px solid #10b981;">
        <strong>3️⃣ Temas disponibles</strong><br/>
        <em style="color: #64748b;">Lista de todos los temas que manejo</em>
    </div>
</div>

<p style="margin-top: 20px;"><strong>💡 Ejemplos de preguntas directas:</strong></p>
<ul style="line-height: 1.8;">
    <li>"¿Cómo saco una licencia de funcionamiento para una bodega?"</li>
    <li>"¿Qué requisitos necesito para comercio ambulatorio?"</li>
    <li>"¿Cuánto cuesta una licencia provisional?"</li>
    <li>"¿Dónde descargo el formato de solicitud?"</li>
</ul>

<p style="background: #fef2f2; padding: 10px; border-radius: 6px; border-left: 3px solid #ef4444;">
    ⚠️ <strong>Importante:</strong> Solo puedo responder preguntas sobre trámites municipales basándome en los documentos oficiales cargados.
</p>
"#;

/// Frequently asked questions.
pub const FAQ_MESSAGE: &str = r#"
<h3 style="color: #3b82f6; margin-bottom: 15px;">❓ Preguntas Frecuentes</h3>

<div style="background: #f8fafc; padding: 15px; border-radius: 8px; margin-bottom: 15px;">
    <strong>1. ¿Qué es una licencia de funcionamiento?</strong>
    <p>Es la autorización municipal para realizar actividades económicas en un establecimiento.</p>
</div>

<div style="background: #f8fafc; padding: 15px; border-radius: 8px; margin-bottom: 15px;">
    <strong>2. ¿Cuánto tiempo demora el trámite?</strong>
    <p>Depende del tipo: licencias automáticas (1 día), con inspección (15 días hábiles).</p>
</div>

<div style="background: #f8fafc; padding: 15px; border-radius: 8px; margin-bottom: 15px;">
    <strong>3. ¿Dónde presento los documentos?</strong>
    <p>En la Oficina de Trámite Documentario del municipio o virtualmente según disponibilidad.</p>
</div>

<p style="margin-top: 20px;"><strong>💬 Para consultas específicas, escribe tu pregunta directamente.</strong></p>
"#;

/// Topic catalogue.
pub const TOPICS_MESSAGE: &str = r#"
<h3 style="color: #10b981; margin-bottom: 15px;">📚 Temas Disponibles</h3>

<div style="display: grid; gap: 15px;">
    <div style="background: #f0f9ff; padding: 15px; border-radius: 8px; border-left: 4px solid #3b82f6;">
        <strong>🏪 Licencias de Funcionamiento</strong>
        <ul style="margin: 10px 0 0 20px;">
            <li>Licencias para bodegas y comercio menor</li>
            <li>Licencias para establecimientos medianos y grandes</li>
            <li>Licencias provisionales</li>
            <li>Requisitos y procedimientos</li>
        </ul>
    </div>

    <div style="background: #fef3c7; padding: 15px; border-radius: 8px; border-left: 4px solid #f59e0b;">
        <strong>📋 Normativas Municipales</strong>
        <ul style="margin: 10px 0 0 20px;">
            <li>Ordenanzas municipales</li>
            <li>Ley de tributación municipal</li>
            <li>Reglamentos y decretos</li>
        </ul>
    </div>

    <div style="background: #f0fdf4; padding: 15px; border-radius: 8px; border-left: 4px solid #10b981;">
        <strong>📝 Formularios y Guías</strong>
        <ul style="margin: 10px 0 0 20px;">
            <li>Formatos de solicitud</li>
            <li>Guías paso a paso</li>
            <li>Declaraciones juradas</li>
        </ul>
    </div>
</div>

<p style="margin-top: 20px;"><strong>💡 Escribe tu pregunta sobre cualquiera de estos temas.</strong></p>
"#;

/// How to ask good questions.
pub const RAG_HELP_MESSAGE: &str = r#"
<h3>De qué trata este sistema RAG</h3>

<p>Este es un sistema de consulta inteligente que busca en documentos municipales para responder tus preguntas. Funciona en 3 pasos:</p>

<ol>
    <li>Recibe tu pregunta y la analiza</li>
    <li>Busca los documentos más relevantes en la base de datos</li>
    <li>Genera una respuesta basándose en la información encontrada</li>
</ol>

<h4>Cómo hacer buenas preguntas</h4>

<p><strong>Preguntas que funcionan bien:</strong></p>
<ul>
    <li>"¿Qué requisitos necesito para una licencia de funcionamiento?"</li>
    <li>"¿Cuánto cuesta renovar una licencia comercial?"</li>
    <li>"¿Dónde puedo descargar el formulario de declaración jurada?"</li>
</ul>

<p><strong>Preguntas poco efectivas:</strong></p>
<ul>
    <li>"Licencia" - Muy general, no especifica qué necesitas saber</li>
    <li>"Información" - Demasiado vago</li>
</ul>

<h4>Consejos para mejores resultados</h4>
<ul>
    <li>Sé específico sobre el trámite que te interesa</li>
    <li>Menciona el tipo de negocio o establecimiento si aplica</li>
    <li>Pregunta por algo concreto: requisitos, costos, plazos, formularios</li>
    <li>Usa preguntas completas en lugar de palabras sueltas</li>
</ul>

<h4>Importante saber</h4>
<ul>
    <li>Solo puedo responder con información que está en los documentos cargados</li>
    <li>No invento respuestas - si no encuentro información, te lo indicaré</li>
</ul>
"#;

/// Shown when retrieval comes back empty. A successful response, not an
/// error.
pub const NO_RESULTS_MESSAGE: &str = r#"
<div style="background: #fef2f2; padding: 20px; border-radius: 10px; border-left: 4px solid #ef4444;">
    <h3 style="color: #ef4444; margin-top: 0;">❌ No se encontraron resultados</h3>
    <p>Lo siento, no encontré información relevante para tu consulta en los documentos disponibles.</p>

    <p><strong>💡 Sugerencias:</strong></p>
    <ul>
        <li>Reformula tu pregunta con otros términos</li>
        <li>Sé más específico sobre el trámite que buscas</li>
        <li>Escribe <strong>"ayuda"</strong> para ver los temas disponibles</li>
    </ul>
</div>
"#;
