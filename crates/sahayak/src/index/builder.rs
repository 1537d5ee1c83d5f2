//! Offline policy-index construction: paragraph chunking, batch embedding,
//! and insertion into the LanceDB dataset. Runs as a build step before the
//! engine serves questions; the router never builds.

use anyhow::Result;
use uuid::Uuid;

use super::{PolicyChunk, PolicyStore};
use crate::embeddings::EmbeddingModel;

/// A policy document to index: (source name, full text).
pub type PolicyDocument = (String, String);

/// Split policy text into chunks on blank lines, packing consecutive
/// paragraphs together up to `max_chars`. A single paragraph longer than
/// `max_chars` is split on char boundaries so no chunk exceeds the cap.
pub fn chunk_paragraphs(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if paragraph.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_oversized(paragraph, max_chars));
            continue;
        }

        if current.is_empty() {
            current.push_str(paragraph);
        } else if current.len() + 2 + paragraph.len() <= max_chars {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(paragraph);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_oversized(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in paragraph.chars() {
        if !piece.is_empty() && piece.len() + ch.len_utf8() > max_chars {
            pieces.push(std::mem::take(&mut piece));
        }
        piece.push(ch);
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Chunk, embed, and insert the given documents. Returns the number of
/// chunks written.
pub async fn index_documents(
    store: &PolicyStore,
    embeddings: &dyn EmbeddingModel,
    documents: &[PolicyDocument],
    max_chars: usize,
) -> Result<usize> {
    let mut total = 0;

    for (source, text) in documents {
        let doc_id = Uuid::new_v4().to_string();
        let chunk_texts = chunk_paragraphs(text, max_chars);
        if chunk_texts.is_empty() {
            tracing::warn!(source = %source, "Policy document produced no chunks");
            continue;
        }

        let refs: Vec<&str> = chunk_texts.iter().map(String::as_str).collect();
        let vectors = embeddings.embed_documents(&refs)?;
        let created_at = chrono::Utc::now().timestamp();

        let chunks: Vec<PolicyChunk> = chunk_texts
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, vector))| PolicyChunk {
                id: Uuid::new_v4().to_string(),
                doc_id: doc_id.clone(),
                chunk_index: i as u32,
                text: text.clone(),
                source: source.clone(),
                heading: text.lines().next().unwrap_or_default().to_string(),
                vector,
                created_at,
            })
            .collect();

        total += chunks.len();
        store.upsert_chunks(chunks).await?;
        tracing::info!(source = %source, chunks = total, "Indexed policy document");
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::BagOfLetters;

    #[test]
    fn packs_small_paragraphs_together() {
        let text = "First rule.\n\nSecond rule.\n\nThird rule.";
        let chunks = chunk_paragraphs(text, 30);
        assert_eq!(chunks, vec!["First rule.\n\nSecond rule.", "Third rule."]);
    }

    #[test]
    fn splits_oversized_paragraphs_at_the_cap() {
        let text = "a".repeat(250);
        let chunks = chunk_paragraphs(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 100));
    }

    #[test]
    fn skips_blank_sections() {
        let chunks = chunk_paragraphs("\n\n   \n\nOnly rule.\n\n", 100);
        assert_eq!(chunks, vec!["Only rule."]);
    }

    #[tokio::test]
    async fn indexes_documents_end_to_end() {
        let dir = std::env::temp_dir().join(format!("sahayak-builder-{}", Uuid::new_v4()));
        let store = PolicyStore::open(dir.to_str().unwrap(), 8).await.unwrap();
        let embedder = BagOfLetters { dimension: 8 };

        let docs = vec![(
            "handbook.txt".to_string(),
            "Leave policy grants twenty days.\n\nCarry-over is not permitted.".to_string(),
        )];
        let written = index_documents(&store, &embedder, &docs, 400).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.count().await.unwrap(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
