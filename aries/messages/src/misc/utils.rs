use chrono::{DateTime, Utc};
use serde::Serialize;

/// Used for serialization of a [`DateTime<Utc>`] to the RFC3339 standard, with
/// millisecond precision.
pub(crate) fn serialize_datetime<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use chrono::format::{Fixed, Item, Numeric::*, Pad::Zero};

    const FMT_ITEMS: &[Item<'static>] = &[
        Item::Numeric(Year, Zero),
        Item::Literal("-"),
        Item::Numeric(Month, Zero),
        Item::Literal("-"),
        Item::Numeric(Day, Zero),
        Item::Literal("T"),
        Item::Numeric(Hour, Zero),
        Item::Literal(":"),
        Item::Numeric(Minute, Zero),
        Item::Literal(":"),
        Item::Numeric(Second, Zero),
        Item::Fixed(Fixed::Nanosecond3),
        Item::Fixed(Fixed::TimezoneOffsetColonZ),
    ];

    format_args!("{}", dt.format_with_items(FMT_ITEMS.iter())).serialize(serializer)
}

pub(crate) fn serialize_opt_datetime<S>(
    dt: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match dt {
        Some(dt) => serialize_datetime(dt, serializer),
        None => serializer.serialize_none(),
    }
}

/// Push-down accumulating macro generating the intermediary [`From::from`] calls
/// that take a message through its protocol enums.
macro_rules! generate_from_stmt {
    ($val:expr, $interm:ty) => {
        <$interm>::from($val)
    };
    ($val:expr, $interm:ty, $($rest:ty),+) => {
        $crate::misc::utils::generate_from_stmt!(<$interm>::from($val), $($rest),+)
    };
}

/// Implements [`From`] for converting a message into a [`crate::AriesMessage`],
/// going through the given protocol enums, innermost first.
macro_rules! transit_to_aries_msg {
    ($msg:ty, $($interm:ty),+) => {
        impl From<$msg> for $crate::AriesMessage {
            fn from(value: $msg) -> Self {
                Self::from($crate::misc::utils::generate_from_stmt!(value, $($interm),+))
            }
        }
    };
}

pub(crate) use generate_from_stmt;
pub(crate) use transit_to_aries_msg;
