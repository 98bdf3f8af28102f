//! API shape tests — validates that response bodies keep the field names
//! and types the HTTP contract promises, independent of any live provider.

use serde_json::json;

/// POST /api/query response: { answer, sources[], document_name?, download_url? }
#[test]
fn test_query_response_shape() {
    let response = json!({
        "answer": "<p>Necesitas...</p>",
        "sources": ["ordenanza_123.pdf", "guia_licencias.pdf"],
        "document_name": "ordenanza_123.pdf",
    });

    assert!(response["answer"].is_string());
    assert!(response["sources"].is_array());
    assert!(response["sources"][0].is_string());
    assert!(response["document_name"].is_string());
    // download_url is optional and omitted when absent
    assert!(response.get("download_url").is_none());
}

/// GET /api/stats response groups documents by category and type.
#[test]
fn test_stats_response_shape() {
    let response = json!({
        "total_documents": 12,
        "total_chunks": 240,
        "total_pages": 318,
        "categories": { "normativa": 8, "comercio": 3, "no category": 1 },
        "document_types": { "ordenanza": 5, "ley": 3, "guia": 3, "no type": 1 },
    });

    assert!(response["total_documents"].is_number());
    assert!(response["total_chunks"].is_number());
    assert!(response["total_pages"].is_number());
    assert!(response["categories"].is_object());
    assert!(response["document_types"].is_object());
    assert!(response["categories"]["no category"].is_number());
}

/// Session responses carry ISO timestamps and a message list; listings keep
/// `messages` empty.
#[test]
fn test_session_response_shape() {
    let response = json!({
        "session_id": "session_abc123",
        "user_id": "u1",
        "created_at": "2026-08-06T12:00:00+00:00",
        "updated_at": "2026-08-06T12:05:00+00:00",
        "message_count": 2,
        "messages": [
            { "role": "user", "content": "¿Qué requisitos?", "created_at": "2026-08-06T12:04:00+00:00" },
            { "role": "assistant", "content": "<p>...</p>", "created_at": "2026-08-06T12:05:00+00:00",
              "metadata": { "sources": ["ordenanza_123.pdf"] } },
        ],
    });

    assert!(response["session_id"].is_string());
    assert!(response["message_count"].is_number());
    assert!(response["messages"].is_array());
    assert_eq!(response["messages"][0]["role"], "user");
    assert_eq!(response["messages"][1]["role"], "assistant");
    assert!(response["messages"][1]["metadata"]["sources"].is_array());
}

/// GET /api/feedback/metrics response includes the derived label.
#[test]
fn test_metrics_response_shape() {
    let response = json!({
        "total_evaluaciones": 100,
        "respuestas_correctas": 85,
        "respuestas_incorrectas": 15,
        "sin_evaluar": 20,
        "exactitud_porcentaje": 85.0,
        "rating_promedio": 4.2,
        "exactitud_label": "Buena",
    });

    assert!(response["total_evaluaciones"].is_number());
    assert!(response["exactitud_porcentaje"].is_number());
    assert!(response["exactitud_label"].is_string());
    // rating_promedio is null when no ratings exist in the window
    let empty = json!({ "rating_promedio": null });
    assert!(empty["rating_promedio"].is_null());
}

/// Error bodies always carry { detail, type } with a stable type tag.
#[test]
fn test_error_body_shape() {
    for tag in [
        "EmbeddingGenerationError",
        "VectorSearchError",
        "ChatGenerationError",
        "SessionStoreError",
        "SessionAlreadyExists",
        "ValidationError",
        "NotFound",
    ] {
        let body = json!({ "detail": "Failed to process query", "type": tag });
        assert!(body["detail"].is_string());
        assert_eq!(body["type"], tag);
    }
}
