pub mod attachment_format_specifier;
