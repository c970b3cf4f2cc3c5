//! Splitting outputs made of several header-introduced tables.

use indexmap::IndexMap;
use regex::Regex;

use crate::error::ParseError;

#[derive(Debug, Clone)]
struct Section {
    name: String,
    header: Regex,
    required: bool,
}

/// Locates the tables of a multi-table output by their header lines.
///
/// Each section's body runs from the end of its header line to the start of
/// the next section's header, whatever order the sections appear in.
#[derive(Debug, Clone, Default)]
pub struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section that must be present.
    pub fn section(mut self, name: &str, header: &str) -> Result<Self, regex::Error> {
        self.sections.push(Section {
            name: name.to_string(),
            header: Regex::new(header)?,
            required: true,
        });
        Ok(self)
    }

    /// Add a section some devices omit.
    pub fn optional(mut self, name: &str, header: &str) -> Result<Self, regex::Error> {
        self.sections.push(Section {
            name: name.to_string(),
            header: Regex::new(header)?,
            required: false,
        });
        Ok(self)
    }

    /// Split `text` into `name -> body`, in declaration order.
    pub fn split<'t>(&self, text: &'t str) -> Result<IndexMap<String, &'t str>, ParseError> {
        let mut found: Vec<(usize, usize, &str)> = Vec::new();
        for section in &self.sections {
            match section.header.find(text) {
                Some(m) => {
                    let body = text[m.end()..].find('\n').map_or(text.len(), |nl| m.end() + nl);
                    found.push((m.start(), body, section.name.as_str()));
                }
                None if section.required => {
                    return Err(ParseError::SectionNotFound {
                        section: section.name.clone(),
                    });
                }
                None => {}
            }
        }
        found.sort_by_key(|(start, _, _)| *start);

        let mut bodies: IndexMap<String, &str> = IndexMap::new();
        for (i, (_, body_start, name)) in found.iter().enumerate() {
            let end = found
                .get(i + 1)
                .map_or(text.len(), |(next, _, _)| *next)
                .max(*body_start);
            bodies.insert(name.to_string(), &text[*body_start..end]);
        }

        let mut ordered = IndexMap::with_capacity(bodies.len());
        for section in &self.sections {
            if let Some(body) = bodies.swap_remove(&section.name) {
                ordered.insert(section.name.clone(), body);
            }
        }
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUNK: &str = "\
--------------------------------------------------------------------------------
Port          Native  Status        Port
              Vlan                  Channel
--------------------------------------------------------------------------------
Eth1/49       1       trunking      Po1

--------------------------------------------------------------------------------
Port          Vlans Allowed on Trunk
--------------------------------------------------------------------------------
Eth1/49       1-4094

--------------------------------------------------------------------------------
Port          STP Forwarding
--------------------------------------------------------------------------------
Eth1/49       none
";

    fn trunk_sections() -> Sections {
        Sections::new()
            .section("port", r"Port\s+Native\s+Status\s+Port")
            .unwrap()
            .section("allowed", r"Port\s+Vlans Allowed on Trunk")
            .unwrap()
            .optional("stp", r"Port\s+STP Forwarding")
            .unwrap()
    }

    #[test]
    fn test_bodies_exclude_headers() {
        let parts = trunk_sections().split(TRUNK).unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts["port"].contains("Eth1/49       1       trunking"));
        assert!(!parts["port"].contains("Vlans Allowed"));
        assert!(!parts["allowed"].contains("Vlans Allowed"));
        assert!(parts["allowed"].contains("1-4094"));
        assert!(parts["stp"].contains("none"));
    }

    #[test]
    fn test_missing_required_section() {
        let err = trunk_sections().split("Port  STP Forwarding\n").unwrap_err();
        assert!(matches!(err, ParseError::SectionNotFound { section } if section == "port"));
    }

    #[test]
    fn test_missing_optional_section() {
        let text = TRUNK.split("Port          STP Forwarding").next().unwrap();
        let parts = trunk_sections().split(text).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(!parts.contains_key("stp"));
    }
}
