use derive_more::From;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::DiscoverFeatures;
use crate::{
    decorators::{thread::Thread, timing::Timing},
    misc::utils::transit_to_aries_msg,
    msg_fields::traits::delayed_serde_for_protocol,
    msg_parts::MsgParts,
    msg_types::DiscoverFeaturesV1Kind,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum DiscoverFeaturesV1 {
    Query(Query),
    Disclose(Disclose),
}

delayed_serde_for_protocol!(DiscoverFeaturesV1, DiscoverFeaturesV1Kind, {
    Query => Query,
    Disclose => Disclose,
});

transit_to_aries_msg!(Query, DiscoverFeaturesV1, DiscoverFeatures);
transit_to_aries_msg!(Disclose, DiscoverFeaturesV1, DiscoverFeatures);

pub type Query = MsgParts<QueryContent, QueryDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct QueryContent {
    pub query: String,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct QueryDecorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

pub type Disclose = MsgParts<DiscloseContent, DiscloseDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct DiscloseContent {
    pub protocols: Vec<ProtocolDescriptor>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ProtocolDescriptor {
    pub pid: String,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct DiscloseDecorators {
    #[serde(rename = "~thread")]
    pub thread: Thread,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{misc::test_utils, msg_types::MessageKind};

    #[test]
    fn test_query() {
        let content = QueryContent::builder()
            .query("https://didcomm.org/*".to_owned())
            .comment("test_comment".to_owned())
            .build();
        let expected = json!({
            "query": "https://didcomm.org/*",
            "comment": "test_comment"
        });
        test_utils::test_msg(
            Query::with_decorators("test".to_owned(), content, QueryDecorators::default()),
            DiscoverFeaturesV1Kind::Query.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_disclose() {
        let content = DiscloseContent::builder()
            .protocols(vec![ProtocolDescriptor::builder()
                .pid("https://didcomm.org/didexchange/1.1".to_owned())
                .roles(vec!["requester".to_owned(), "responder".to_owned()])
                .build()])
            .build();
        let decorators = DiscloseDecorators::builder()
            .thread(Thread::new("query_id".to_owned()))
            .build();
        let expected = json!({
            "protocols": [{
                "pid": "https://didcomm.org/didexchange/1.1",
                "roles": ["requester", "responder"]
            }],
            "~thread": { "thid": "query_id" }
        });
        test_utils::test_msg(
            Disclose::with_decorators("test".to_owned(), content, decorators),
            DiscoverFeaturesV1Kind::Disclose.msg_type(),
            expected,
        );
    }
}
