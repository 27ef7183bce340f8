use crate::vibe::Vibe;

/// Longest bio the model is asked to produce
pub const MAX_BIO_CHARS: usize = 160;

/// Prompt for providers that are called directly (no hosted endpoint).
///
/// Asks for exactly two bios labelled "1." and "2." so the reply splits into
/// cards with the marker extraction.
pub fn build_bio_prompt(bio: &str, vibe: Vibe) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Generate 2 {} social media bios with no hashtags and clearly labeled \"1.\" and \"2.\". ",
        vibe.as_str().to_lowercase()
    ));

    if vibe == Vibe::Funny {
        prompt.push_str("Make sure there is a joke in there and it's a little ridiculous. ");
    }

    prompt.push_str(&format!(
        "Make sure each generated bio is less than {} characters, has short sentences \
         that are found in social media bios, and base them on this context: {}",
        MAX_BIO_CHARS,
        bio.trim()
    ));

    if !bio.trim().ends_with('.') {
        prompt.push('.');
    }

    prompt
}
