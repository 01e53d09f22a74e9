use std::net::IpAddr;

/// Seam to the hosts directory.
///
/// The directory itself (conventionally a CSV of `hostname, privateip,
/// publicip` rows) belongs to the embedding application; the session only
/// needs a way to turn a name into an address. `prefer_public` carries the
/// caller's routing preference: `Some(true)` favors the public address,
/// `Some(false)` the private one, and `None` leaves the choice to the
/// directory (implementations conventionally fall back to whichever
/// address is present, private first).
pub trait HostDirectory {
    fn resolve(&self, name: &str, prefer_public: Option<bool>) -> Option<IpAddr>;
}

impl<F> HostDirectory for F
where
    F: Fn(&str, Option<bool>) -> Option<IpAddr>,
{
    fn resolve(&self, name: &str, prefer_public: Option<bool>) -> Option<IpAddr> {
        self(name, prefer_public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticDirectory {
        private: Option<IpAddr>,
        public: Option<IpAddr>,
    }

    impl HostDirectory for StaticDirectory {
        fn resolve(&self, name: &str, prefer_public: Option<bool>) -> Option<IpAddr> {
            if name != "workstation" {
                return None;
            }
            match prefer_public {
                Some(true) => self.public.or(self.private),
                Some(false) => self.private.or(self.public),
                None => self.private.or(self.public),
            }
        }
    }

    #[test]
    fn preference_falls_back_to_whatever_exists() {
        let dir = StaticDirectory {
            private: Some("10.0.0.5".parse().unwrap()),
            public: None,
        };
        // Asking for public still lands on the private address
        assert_eq!(
            dir.resolve("workstation", Some(true)),
            Some("10.0.0.5".parse().unwrap())
        );
        assert_eq!(dir.resolve("laptop", None), None);
    }

    #[test]
    fn closures_are_directories_too() {
        let addr: IpAddr = "192.0.2.7".parse().unwrap();
        let dir = move |name: &str, _prefer: Option<bool>| {
            (name == "kiosk").then_some(addr)
        };
        assert_eq!(dir.resolve("kiosk", None), Some(addr));
        assert_eq!(dir.resolve("other", None), None);
    }
}
