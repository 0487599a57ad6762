use std::collections::BTreeMap;
use std::fmt::Write;

use crate::chart::{ChartRecord, PlanetPosition, Significators};

pub fn default_request(name: &str) -> String {
    format!("Please provide a complete Vedic astrology reading for {}", name)
}

/// Persona and chart data sent ahead of every conversation.
pub fn system_prompt(chart: &ChartRecord) -> String {
    let mut prompt = format!(
        "You are an expert Vedic astrologer. Provide readings for {}.\n\
         Birth: {} {} (UTC{:+})\n\
         Data:\n",
        chart.name,
        chart.birth.date_string(),
        chart.birth.time_string(),
        chart.birth.utc_offset,
    );

    prompt.push_str("- Planet Data:\n");
    for (planet, position) in &chart.snapshot.planets {
        let _ = writeln!(prompt, "  - {}: {}", planet, describe_position(position));
    }

    prompt.push_str("- House Significators:\n");
    write_significators(&mut prompt, &chart.house_significators);
    prompt.push_str("- Planet Significators:\n");
    write_significators(&mut prompt, &chart.planet_significators);

    prompt.push_str("- Vimshottari Dasa:\n");
    if chart.vimshottari_dasa.is_null() {
        prompt.push_str("  (not provided)\n");
    } else {
        let dasa = serde_yaml::to_string(&chart.vimshottari_dasa)
            .unwrap_or_else(|_| chart.vimshottari_dasa.to_string());
        for line in dasa.lines() {
            let _ = writeln!(prompt, "  {}", line);
        }
    }

    prompt
}

fn describe_position(position: &PlanetPosition) -> String {
    let mut parts = vec![format!("{:.2}° sidereal", position.longitude)];
    if let Some(rasi) = &position.rasi {
        match &position.rasi_lord {
            Some(lord) => parts.push(format!("in {} (lord {})", rasi, lord)),
            None => parts.push(format!("in {}", rasi)),
        }
    }
    if let Some(dms) = &position.sign_longitude_dms {
        parts.push(format!("at {}", dms));
    }
    if let Some(nakshatra) = &position.nakshatra {
        match &position.nakshatra_lord {
            Some(lord) => parts.push(format!("nakshatra {} (lord {})", nakshatra, lord)),
            None => parts.push(format!("nakshatra {}", nakshatra)),
        }
    }
    if let Some(sub) = &position.sub_lord {
        parts.push(format!("sub lord {}", sub));
    }
    if let Some(sub_sub) = &position.sub_sub_lord {
        parts.push(format!("sub-sub lord {}", sub_sub));
    }
    if let Some(house) = position.house {
        parts.push(format!("house {}", house));
    }
    if position.retrograde {
        parts.push("retrograde".to_string());
    }
    parts.join(", ")
}

fn write_significators(prompt: &mut String, table: &BTreeMap<String, Significators>) {
    if table.is_empty() {
        prompt.push_str("  (not provided)\n");
        return;
    }
    let list = |names: &[String]| {
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    };
    for (key, row) in table {
        let _ = writeln!(
            prompt,
            "  - {}: A={}; B={}; C={}; D={}",
            key,
            list(&row.a),
            list(&row.b),
            list(&row.c),
            list(&row.d)
        );
    }
}
