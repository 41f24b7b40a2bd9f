use std::fmt;

/// A validation rule in the `name:param1,param2` notation, e.g. `min:3` or `in:draft,published`.
///
/// Rules are opaque to the schema, the evaluator decides what a name means. `regex` keeps its
/// parameter whole since patterns may contain commas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Rule {
    pub name: String,
    pub parameters: Vec<String>,
}

impl Rule {
    pub fn new(rule: &str) -> Self {
        let (name, parameters) = match rule.split_once(':') {
            Some((name, parameters)) if name.trim() == "regex" => (name, vec![parameters.to_string()]),
            Some((name, parameters)) => (
                name,
                parameters.split(',').map(|parameter| parameter.trim().to_string()).collect(),
            ),
            None => (rule, Vec::new()),
        };

        Rule {
            name: name.trim().to_string(),
            parameters,
        }
    }

    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl From<String> for Rule {
    fn from(rule: String) -> Self {
        Rule::new(&rule)
    }
}

impl From<Rule> for String {
    fn from(rule: Rule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.parameters.is_empty() {
            write!(f, ":{}", self.parameters.join(","))?;
        }
        Ok(())
    }
}
