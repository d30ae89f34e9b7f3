//! Provider-neutral multi-part analysis request.

use crate::images::DecodedImage;

/// One ordered piece of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    Image(DecodedImage),
}

/// Ordered content submitted to the model in a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub parts: Vec<RequestPart>,
}

impl AnalysisRequest {
    /// Build a request in the order: prompt, context, source URLs, images.
    ///
    /// A blank context is left out; each URL becomes its own text part.
    pub fn build(
        prompt: &str,
        context: Option<&str>,
        urls: &[String],
        images: Vec<DecodedImage>,
    ) -> Self {
        let mut parts = Vec::with_capacity(2 + urls.len() + images.len());
        parts.push(RequestPart::Text(prompt.to_string()));

        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            parts.push(RequestPart::Text(context.to_string()));
        }

        parts.extend(urls.iter().cloned().map(RequestPart::Text));
        parts.extend(images.into_iter().map(RequestPart::Image));

        Self { parts }
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, RequestPart::Image(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn image(source: &str) -> DecodedImage {
        DecodedImage {
            source: source.to_string(),
            width: 1,
            height: 1,
            format: ImageFormat::Png,
            mime_type: "image/png",
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_build_orders_parts() {
        let urls = vec!["https://a/1.png".to_string(), "https://a/2.png".to_string()];
        let request = AnalysisRequest::build(
            "PROMPT",
            Some("note text"),
            &urls,
            vec![image("one"), image("two")],
        );

        assert_eq!(
            request.parts,
            vec![
                RequestPart::Text("PROMPT".to_string()),
                RequestPart::Text("note text".to_string()),
                RequestPart::Text("https://a/1.png".to_string()),
                RequestPart::Text("https://a/2.png".to_string()),
                RequestPart::Image(image("one")),
                RequestPart::Image(image("two")),
            ]
        );
        assert_eq!(request.image_count(), 2);
    }

    #[test]
    fn test_build_omits_blank_context() {
        let request = AnalysisRequest::build("P", Some("  "), &[], vec![image("x")]);
        assert_eq!(request.parts.len(), 2);

        let request = AnalysisRequest::build("P", None, &[], vec![image("x")]);
        assert_eq!(request.parts.len(), 2);
    }
}
