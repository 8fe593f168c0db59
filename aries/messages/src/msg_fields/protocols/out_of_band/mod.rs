//! Module containing the `out-of-band` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0434-outofband/README.md>).

pub mod invitation;
pub mod reuse;
pub mod reuse_accepted;

use derive_more::From;

use self::{
    invitation::Invitation, reuse::HandshakeReuse, reuse_accepted::HandshakeReuseAccepted,
};
use crate::{
    error::{MsgTypeError, MsgTypeResult},
    misc::utils::transit_to_aries_msg,
    msg_fields::traits::delayed_serde_for_protocol,
    msg_types::OutOfBandKind,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum OutOfBand {
    Invitation(Invitation),
    HandshakeReuse(HandshakeReuse),
    HandshakeReuseAccepted(HandshakeReuseAccepted),
}

impl OutOfBand {
    pub(crate) fn validate(&self) -> MsgTypeResult<()> {
        match self {
            Self::Invitation(msg) => msg.content.validate(),
            Self::HandshakeReuse(msg) => thread_with_parent(&msg.decorators.thread),
            Self::HandshakeReuseAccepted(msg) => thread_with_parent(&msg.decorators.thread),
        }
    }
}

fn thread_with_parent(thread: &crate::decorators::thread::Thread) -> MsgTypeResult<()> {
    if thread.pthid.is_none() {
        return Err(MsgTypeError::validation(
            "handshake reuse messages must reference the invitation in ~thread.pthid",
        ));
    }
    Ok(())
}

delayed_serde_for_protocol!(OutOfBand, OutOfBandKind, {
    Invitation => Invitation,
    HandshakeReuse => HandshakeReuse,
    HandshakeReuseAccepted => HandshakeReuseAccepted,
});

transit_to_aries_msg!(Invitation, OutOfBand);
transit_to_aries_msg!(HandshakeReuse, OutOfBand);
transit_to_aries_msg!(HandshakeReuseAccepted, OutOfBand);
