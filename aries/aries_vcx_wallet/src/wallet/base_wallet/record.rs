use typed_builder::TypedBuilder;

use super::record_tags::RecordTags;

#[derive(Debug, Default, Clone, PartialEq, TypedBuilder)]
pub struct Record {
    #[builder(setter(into))]
    category: String,
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    value: String,
    #[builder(default)]
    tags: RecordTags,
}

impl Record {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tags(&self) -> &RecordTags {
        &self.tags
    }

    pub(crate) fn set_value(&mut self, value: &str) {
        value.clone_into(&mut self.value);
    }

    pub(crate) fn set_tags(&mut self, tags: RecordTags) {
        self.tags = tags;
    }
}
