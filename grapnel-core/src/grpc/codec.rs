//! # Dynamic Protobuf Codec
//!
//! An implementation of `tonic::codec::Codec` that moves [`DynamicMessage`] values,
//! letting `tonic` transport messages whose schema only exists at runtime.
//!
//! Validation of caller-supplied JSON against the input descriptor happens *before* a
//! message reaches this codec (see [`crate::invoke`]), so encoding here is a plain
//! serialization step. Decoding needs a descriptor for the incoming side, which the
//! codec carries: the response type on a client, the request type on a server.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A codec transporting [`DynamicMessage`] values for one specific method.
pub struct DynamicCodec {
    /// Schema of the messages this side receives.
    incoming: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(incoming: MessageDescriptor) -> Self {
        Self { incoming }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.incoming.clone())
    }
}

/// Serializes an already-validated dynamic message into the gRPC frame.
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        // A DynamicMessage carries its own descriptor, so encoding cannot mismatch.
        item.encode_raw(dst);
        Ok(())
    }
}

/// Deserializes received bytes into a dynamic message of the expected type.
pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut message = DynamicMessage::new(self.0.clone());
        message
            .merge(src)
            .map_err(|e| Status::internal(format!("Failed to decode Protobuf bytes: {e}")))?;
        Ok(Some(message))
    }
}
