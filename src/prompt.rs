//! Prompt templates, one per request kind. Pure string interpolation: a given
//! form always produces the same instruction string, and nothing here can fail.

use crate::panel::{PanelForm, RequestKind};

pub fn build(kind: RequestKind, form: &PanelForm) -> String {
    match kind {
        RequestKind::PsychAnalysis => psych_analysis(&form.topic),
        RequestKind::ScriptConstruction => script(
            &form.topic,
            form.duration_minutes,
            &form.style,
            &form.language,
        ),
        // The image panel sends the scene description verbatim.
        RequestKind::EvidenceImage => form.topic.clone(),
        RequestKind::SeoStrategy => seo_strategy(&form.topic),
        RequestKind::MarketFunnel => market_funnel(&form.topic),
    }
}

fn psych_analysis(topic: &str) -> String {
    format!(
        "You are a criminal psychology expert and behavioral profiler (Mind Hunter).\n\
         Analyze the following topic or channel description: \"{topic}\".\n\
         \n\
         Provide a psychological profile, target audience insight, and 3 key hooks \
         that would trigger a dopamine response in this audience.\n\
         Format with Markdown. Be concise, dark, and professional."
    )
}

fn script(topic: &str, duration_minutes: f32, style: &str, language: &str) -> String {
    format!(
        "Write a viral short-form video script (TikTok/Reels/Shorts).\n\
         Topic: {topic}\n\
         Target Language: {language}\n\
         Visual Style: {style}\n\
         Estimated Duration: {duration_minutes} minutes.\n\
         \n\
         Structure:\n\
         1. Hook (0-3s)\n\
         2. The Problem/Pain Point\n\
         3. The Psychology/Solution\n\
         4. CTA\n\
         \n\
         Use a \"Criminal Mind\" or \"Dark Psychology\" tone."
    )
}

fn seo_strategy(topic: &str) -> String {
    format!(
        "Analyze SEO for the topic: \"{topic}\" specifically for a \"Dark Psychology\" \
         or \"True Crime\" niche channel.\n\
         Return a JSON-like structure (but just clear text) with:\n\
         - 5 High CTR Titles\n\
         - 10 Viral Tags\n\
         - Description opening with keywords"
    )
}

fn market_funnel(topic: &str) -> String {
    format!(
        "Create a product funnel for the niche: \"{topic}\".\n\
         1. Lead Magnet (Free)\n\
         2. Tripwire Product ($7-$27)\n\
         3. Core Offer ($97+)\n\
         \n\
         Explain the psychological trigger for each."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(topic: &str) -> PanelForm {
        PanelForm {
            topic: topic.to_string(),
            ..PanelForm::default()
        }
    }

    #[test]
    fn building_twice_yields_identical_strings() {
        let mut script_form = form("Stoicism");
        script_form.duration_minutes = 2.5;
        script_form.language = "English".to_string();
        for kind in RequestKind::ALL {
            let first = build(kind, &script_form);
            let second = build(kind, &script_form);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn every_script_field_lands_in_the_prompt() {
        let prompt = script("Stoicism", 2.0, "Dark/Mystery", "English");
        assert!(prompt.contains("Topic: Stoicism"));
        assert!(prompt.contains("Estimated Duration: 2 minutes."));
        assert!(prompt.contains("Target Language: English"));
        assert!(prompt.contains("Visual Style: Dark/Mystery"));
    }

    #[test]
    fn fractional_duration_survives_interpolation() {
        let prompt = script("Sleep paralysis", 1.5, "Cinematic", "Spanish");
        assert!(prompt.contains("Estimated Duration: 1.5 minutes."));
    }

    #[test]
    fn image_prompt_is_the_raw_scene_description() {
        let description = "A dark interrogation room with a single light bulb";
        assert_eq!(
            build(RequestKind::EvidenceImage, &form(description)),
            description
        );
    }

    #[test]
    fn text_templates_quote_the_topic() {
        assert!(psych_analysis("Dark Psychology").contains("\"Dark Psychology\""));
        assert!(seo_strategy("Dark Psychology").contains("\"Dark Psychology\""));
        assert!(market_funnel("Self Defense").contains("\"Self Defense\""));
    }
}
