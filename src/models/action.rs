//! Outbound actions returned to the dispatcher for delivery.

use bytes::Bytes;

/// An image with the caption shown beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionedImage {
    /// Suggested file name for transports that upload files.
    pub file_name: String,
    /// Encoded image bytes.
    pub bytes: Bytes,
    /// Caption text.
    pub caption: String,
}

/// Something the dispatcher should show the user.
///
/// `menu` lists the labels currently valid as quick-select buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// A text message with quick-select options.
    ShowText {
        /// Message text.
        message: String,
        /// Button labels.
        menu: Vec<String>,
    },
    /// A batch of images, e.g. template previews.
    ShowImages(Vec<CaptionedImage>),
    /// The composited result.
    DeliverImage {
        /// Result image.
        image: CaptionedImage,
        /// Button labels shown after delivery.
        menu: Vec<String>,
    },
}
