use rust_decimal::Decimal;

use super::sink::{XmlSink, format_decimal};
use crate::core::InvoiceError;
use crate::profile::Profile;

/// One entry per attempted open element.
#[derive(Debug, Clone, Copy)]
struct VisibilityFrame {
    gate: Profile,
    visible: bool,
}

/// Filtering decorator over an [`XmlSink`].
///
/// Every write call carries a gate: the set of profiles that may contain the
/// content. The call reaches the sink only when the active profile is
/// admitted by the gate and every enclosing element is visible. A suppressed
/// element suppresses its whole subtree, whatever the descendants' gates.
///
/// Frames are pushed for every open call, visible or not, so open and close
/// calls stay balanced. Suppression is silent and never an error.
pub struct ProfileAwareXmlWriter<S: XmlSink> {
    sink: S,
    profile: Profile,
    frames: Vec<VisibilityFrame>,
}

impl<S: XmlSink> ProfileAwareXmlWriter<S> {
    pub fn new(sink: S, profile: Profile) -> Self {
        Self {
            sink,
            profile,
            frames: Vec::new(),
        }
    }

    /// The active output profile.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Number of currently open (attempted) elements.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether content written now would reach the sink (ignoring gates).
    pub fn is_visible(&self) -> bool {
        self.frames.iter().all(|f| f.visible)
    }

    pub fn gate_matches(&self, gate: Profile) -> bool {
        self.profile.is_admitted_by(gate)
    }

    /// Release the sink. Fails if elements are still open.
    pub fn into_sink(self) -> Result<S, InvoiceError> {
        if !self.frames.is_empty() {
            return Err(InvoiceError::UnbalancedElement("elements left open"));
        }
        Ok(self.sink)
    }

    pub fn start_element(&mut self, name: &str, gate: Profile) -> Result<&mut Self, InvoiceError> {
        self.open(name, None, gate)
    }

    /// Open an element and bind its prefix to `namespace`.
    pub fn start_element_ns(
        &mut self,
        name: &str,
        namespace: &str,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        self.open(name, Some(namespace), gate)
    }

    fn open(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        let visible = self.is_visible() && self.gate_matches(gate);
        self.frames.push(VisibilityFrame { gate, visible });
        if visible {
            self.sink.start_element(name, namespace)?;
        }
        Ok(self)
    }

    /// Close the innermost open element.
    ///
    /// Closing with no open element means the caller's open/close calls are
    /// unbalanced and is reported as [`InvoiceError::UnbalancedElement`].
    pub fn end_element(&mut self) -> Result<&mut Self, InvoiceError> {
        let frame = self
            .frames
            .pop()
            .ok_or(InvoiceError::UnbalancedElement("end_element on empty stack"))?;
        if frame.visible && self.gate_matches(frame.gate) {
            self.sink.end_element()?;
        }
        Ok(self)
    }

    pub fn text_element(
        &mut self,
        name: &str,
        text: &str,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        self.start_element(name, gate)?;
        self.value(text)?;
        self.end_element()
    }

    /// Like [`Self::text_element`], but writes nothing for `None` or empty text.
    pub fn optional_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        match text {
            Some(t) if !t.is_empty() => self.text_element(name, t, gate),
            _ => Ok(self),
        }
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        self.start_element(name, gate)?;
        for (k, v) in attrs {
            self.attribute(k, v, Profile::ANY)?;
        }
        self.value(text)?;
        self.end_element()
    }

    /// Write an attribute on the innermost open element.
    ///
    /// Only that element's visibility is consulted, not the whole ancestry;
    /// the gate is tested against the active profile.
    pub fn attribute(
        &mut self,
        name: &str,
        value: &str,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        let top = self
            .frames
            .last()
            .ok_or(InvoiceError::UnbalancedElement("attribute outside of an element"))?;
        if top.visible && self.gate_matches(gate) {
            self.sink.attribute(name, value)?;
        }
        Ok(self)
    }

    pub fn optional_attribute(
        &mut self,
        name: &str,
        value: Option<&str>,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        match value {
            Some(v) if !v.is_empty() => self.attribute(name, v, gate),
            _ => Ok(self),
        }
    }

    /// Write character data into the innermost open element.
    pub fn value(&mut self, text: &str) -> Result<&mut Self, InvoiceError> {
        let frame = self
            .frames
            .last()
            .ok_or(InvoiceError::UnbalancedElement("value without open element"))?;
        if frame.visible {
            self.sink.value(text)?;
        }
        Ok(self)
    }

    pub fn comment(&mut self, text: &str) -> Result<&mut Self, InvoiceError> {
        if self.is_visible() {
            self.sink.comment(text)?;
        }
        Ok(self)
    }

    /// Decimal amount, optionally with a `currencyID` attribute.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: Option<&str>,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        match currency {
            Some(c) => self.text_element_with_attrs(
                name,
                &format_decimal(amount),
                &[("currencyID", c)],
                gate,
            ),
            None => self.text_element(name, &format_decimal(amount), gate),
        }
    }

    /// Quantity with a `unitCode` attribute.
    pub fn quantity_element(
        &mut self,
        name: &str,
        qty: Decimal,
        unit: &str,
        gate: Profile,
    ) -> Result<&mut Self, InvoiceError> {
        self.text_element_with_attrs(name, &format_decimal(qty), &[("unitCode", unit)], gate)
    }
}
