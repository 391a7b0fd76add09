/// Batch of effect requests returned from `init` and `update`.
/// The request type `Req` is the app's request enum.
pub struct CoreCmd<Req>(pub Vec<Req>);

impl<Req> CoreCmd<Req> {
    /// No effects.
    pub fn none() -> Self {
        CoreCmd(Vec::new())
    }

    /// A single request.
    pub fn single(req: Req) -> Self {
        CoreCmd(vec![req])
    }

    /// Flatten several commands into one, keeping their order.
    pub fn batch(cmds: impl IntoIterator<Item = CoreCmd<Req>>) -> Self {
        let mut all = Vec::new();
        for CoreCmd(mut v) in cmds {
            all.append(&mut v);
        }
        CoreCmd(all)
    }

    /// Append another command after this one.
    pub fn and(mut self, other: CoreCmd<Req>) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn requests(&self) -> &[Req] {
        &self.0
    }

    /// Access inner requests (for runtime dispatch)
    pub fn into_inner(self) -> Vec<Req> {
        self.0
    }
}

impl<Req> Default for CoreCmd<Req> {
    fn default() -> Self {
        Self::none()
    }
}

impl<Req> FromIterator<Req> for CoreCmd<Req> {
    fn from_iter<I: IntoIterator<Item = Req>>(iter: I) -> Self {
        CoreCmd(iter.into_iter().collect())
    }
}
