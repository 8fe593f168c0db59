//! Module containing the `didexchange` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0023-did-exchange/README.md>).

pub mod complete;
pub mod problem_report;
pub mod request;
pub mod response;

use derive_more::From;

use self::{
    complete::Complete, problem_report::ProblemReport, request::Request, response::Response,
};
use crate::{
    error::{MsgTypeError, MsgTypeResult},
    misc::utils::transit_to_aries_msg,
    msg_fields::traits::delayed_serde_for_protocol,
    msg_types::DidExchangeKind,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum DidExchange {
    Request(Request),
    Response(Response),
    Complete(Complete),
    ProblemReport(ProblemReport),
}

impl DidExchange {
    pub(crate) fn validate(&self) -> MsgTypeResult<()> {
        match self {
            Self::Request(msg) => {
                if msg.content.did.is_empty() {
                    return Err(MsgTypeError::validation("request is missing a DID"));
                }
                if msg.content.label.is_empty() {
                    return Err(MsgTypeError::validation("request is missing a label"));
                }
            }
            Self::Response(msg) => {
                if msg.content.did.is_empty() {
                    return Err(MsgTypeError::validation("response is missing a DID"));
                }
                if msg.decorators.thread.thid.is_none() {
                    return Err(MsgTypeError::validation("response is missing ~thread.thid"));
                }
            }
            Self::Complete(msg) => {
                if msg.decorators.thread.thid.is_none() || msg.decorators.thread.pthid.is_none() {
                    return Err(MsgTypeError::validation(
                        "complete must carry both ~thread.thid and ~thread.pthid",
                    ));
                }
            }
            Self::ProblemReport(_) => {}
        }
        Ok(())
    }
}

delayed_serde_for_protocol!(DidExchange, DidExchangeKind, {
    Request => Request,
    Response => Response,
    Complete => Complete,
    ProblemReport => ProblemReport,
});

transit_to_aries_msg!(Request, DidExchange);
transit_to_aries_msg!(Response, DidExchange);
transit_to_aries_msg!(Complete, DidExchange);
transit_to_aries_msg!(ProblemReport, DidExchange);
