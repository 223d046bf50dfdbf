use anyhow::Result;

use crate::aggregate::CategoryGroup;
use crate::models::format_qty;

/// Plain-text shopping list: a header per category, one `- qty unit name`
/// line per item, blank line between categories.
#[must_use]
pub fn build_text(groups: &[CategoryGroup]) -> String {
    groups
        .iter()
        .map(|group| {
            let items = group
                .items
                .iter()
                .map(|item| format!("- {} {} {}", format_qty(item.qty), item.unit, item.name))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}:\n{items}", group.category)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// CSV export: header `Kategorie;Zutat;Menge;Einheit`, semicolon-delimited,
/// every field quoted, decimal comma for quantities.
pub fn build_csv(groups: &[CategoryGroup]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(["Kategorie", "Zutat", "Menge", "Einheit"])?;
    for group in groups {
        for item in &group.items {
            let menge = item.qty.to_string().replace('.', ",");
            writer.write_record([
                group.category.as_str(),
                item.name.as_str(),
                menge.as_str(),
                item.unit.as_str(),
            ])?;
        }
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ShoppingItem;

    fn groups() -> Vec<CategoryGroup> {
        vec![
            CategoryGroup {
                category: "Obst".to_string(),
                items: vec![
                    ShoppingItem {
                        name: "Apfel".to_string(),
                        qty: 2.0,
                        unit: "st".to_string(),
                    },
                    ShoppingItem {
                        name: "Zitrone".to_string(),
                        qty: 0.5,
                        unit: "st".to_string(),
                    },
                ],
            },
            CategoryGroup {
                category: "Öle/Extras".to_string(),
                items: vec![ShoppingItem {
                    name: "Hanföl".to_string(),
                    qty: 10.0,
                    unit: "ml".to_string(),
                }],
            },
        ]
    }

    #[test]
    fn test_build_text_layout() {
        let text = build_text(&groups());
        assert_eq!(
            text,
            "Obst:\n- 2 st Apfel\n- 0.5 st Zitrone\n\nÖle/Extras:\n- 10 ml Hanföl"
        );
    }

    #[test]
    fn test_build_text_empty() {
        assert_eq!(build_text(&[]), "");
    }

    #[test]
    fn test_build_csv_format() {
        let csv = build_csv(&groups()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"Kategorie\";\"Zutat\";\"Menge\";\"Einheit\""
        );
        assert_eq!(lines.next().unwrap(), "\"Obst\";\"Apfel\";\"2\";\"st\"");
        // Decimal comma, full precision.
        assert_eq!(lines.next().unwrap(), "\"Obst\";\"Zitrone\";\"0,5\";\"st\"");
        assert_eq!(
            lines.next().unwrap(),
            "\"Öle/Extras\";\"Hanföl\";\"10\";\"ml\""
        );
        assert!(lines.next().is_none());
    }
}
