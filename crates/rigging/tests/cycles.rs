// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for cycle detection.

#![allow(missing_docs, reason = "test code")]

use std::sync::Arc;

use rigging::{Args, Bindings, Blueprint, BoxError, ErrorKind, Param, SchemaRegistry, Session, TypeKey};

#[derive(Debug)]
struct Ouroboros {
    _inner: Arc<Ouroboros>,
}

impl Blueprint for Ouroboros {
    fn params() -> Vec<Param> {
        vec![Param::of::<Ouroboros>("inner")]
    }

    fn build(mut args: Args) -> Result<Self, BoxError> {
        Ok(Self {
            _inner: args.take::<Ouroboros>()?,
        })
    }
}

#[derive(Debug)]
struct Ping {
    _pong: Arc<Pong>,
}

#[derive(Debug)]
struct Pong {
    _ping: Arc<Ping>,
}

impl Blueprint for Ping {
    fn params() -> Vec<Param> {
        vec![Param::of::<Pong>("pong")]
    }

    fn build(mut args: Args) -> Result<Self, BoxError> {
        Ok(Self {
            _pong: args.take::<Pong>()?,
        })
    }
}

impl Blueprint for Pong {
    fn params() -> Vec<Param> {
        vec![Param::of::<Ping>("ping")]
    }

    fn build(mut args: Args) -> Result<Self, BoxError> {
        Ok(Self {
            _ping: args.take::<Ping>()?,
        })
    }
}

fn chain_of(error: &rigging::Error) -> &[TypeKey] {
    match error.kind() {
        ErrorKind::Cycle { chain } => chain,
        other => panic!("cycle expected, got {other:?}"),
    }
}

#[test]
fn self_cycle_fails_immediately() {
    let schema = SchemaRegistry::new().with::<Ouroboros>();
    let session = Session::with_schema(Bindings::new(), Vec::new(), Arc::new(schema))
        .expect("session builds");

    let error = session.get::<Ouroboros>().expect_err("self-cycle detected");
    let chain = chain_of(&error);

    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0], TypeKey::of::<Ouroboros>());
    assert_eq!(chain[1], TypeKey::of::<Ouroboros>());
}

#[test]
fn mutual_cycle_reports_every_type_from_either_entry_point() {
    let schema = SchemaRegistry::new().with::<Ping>().with::<Pong>();
    let session = Session::with_schema(Bindings::new(), Vec::new(), Arc::new(schema))
        .expect("session builds");

    let from_ping = session.get::<Ping>().expect_err("cycle detected");
    let chain = chain_of(&from_ping);
    assert!(chain.contains(&TypeKey::of::<Ping>()));
    assert!(chain.contains(&TypeKey::of::<Pong>()));
    assert_eq!(chain.first(), chain.last());

    let from_pong = session.get::<Pong>().expect_err("cycle detected");
    let chain = chain_of(&from_pong);
    assert!(chain.contains(&TypeKey::of::<Ping>()));
    assert!(chain.contains(&TypeKey::of::<Pong>()));
}

#[test]
fn redirect_cycle_is_detected() {
    struct Left;
    struct Right;

    let bindings = Bindings::new()
        .bind::<Left>().to::<Right>()
        .bind::<Right>().to::<Left>();

    let session = Session::new(bindings, Vec::new()).expect("session builds");
    let error = session.get_by_key(TypeKey::of::<Left>()).expect_err("cycle detected");

    let chain = chain_of(&error);
    assert_eq!(
        chain,
        &[
            TypeKey::of::<Left>(),
            TypeKey::of::<Right>(),
            TypeKey::of::<Left>(),
        ][..]
    );
}

#[test]
fn singleton_participating_in_a_cycle_is_detected_and_not_cached() {
    #[derive(Debug)]
    struct Hub {
        _spoke: Arc<Spoke>,
    }

    #[derive(Debug)]
    struct Spoke {
        _hub: Arc<Hub>,
    }

    impl Blueprint for Hub {
        fn params() -> Vec<Param> {
            vec![Param::of::<Spoke>("spoke")]
        }

        fn build(mut args: Args) -> Result<Self, BoxError> {
            Ok(Self {
                _spoke: args.take::<Spoke>()?,
            })
        }
    }

    impl Blueprint for Spoke {
        fn params() -> Vec<Param> {
            vec![Param::of::<Hub>("hub")]
        }

        fn build(mut args: Args) -> Result<Self, BoxError> {
            Ok(Self {
                _hub: args.take::<Hub>()?,
            })
        }
    }

    let schema = SchemaRegistry::new().with::<Hub>().with::<Spoke>();
    let bindings = Bindings::new().bind::<Hub>().as_singleton();
    let session =
        Session::with_schema(bindings, Vec::new(), Arc::new(schema)).expect("session builds");

    let error = session.get::<Hub>().expect_err("cycle detected");
    assert!(matches!(error.kind(), ErrorKind::Cycle { .. }));

    // The failed build left nothing behind.
    assert!(session.try_get::<Hub>().is_none());
}

#[test]
fn eager_cycle_fails_session_creation() {
    struct Knot {
        _knot: Arc<Knot>,
    }

    impl Blueprint for Knot {
        fn params() -> Vec<Param> {
            vec![Param::of::<Knot>("knot")]
        }

        fn build(mut args: Args) -> Result<Self, BoxError> {
            Ok(Self {
                _knot: args.take::<Knot>()?,
            })
        }
    }

    let schema = SchemaRegistry::new().with::<Knot>();
    let bindings = Bindings::new().bind::<Knot>().as_eager_singleton();

    let error = Session::with_schema(bindings, Vec::new(), Arc::new(schema))
        .expect_err("eager build hits the cycle");
    assert!(matches!(error.kind(), ErrorKind::Cycle { .. }));
}

#[test]
fn acyclic_graphs_are_untouched_by_detection() {
    struct Leaf;
    struct Node {
        _leaf: Arc<Leaf>,
    }

    impl Blueprint for Leaf {
        fn params() -> Vec<Param> {
            Vec::new()
        }

        fn build(_args: Args) -> Result<Self, BoxError> {
            Ok(Self)
        }
    }

    impl Blueprint for Node {
        fn params() -> Vec<Param> {
            vec![Param::of::<Leaf>("leaf")]
        }

        fn build(mut args: Args) -> Result<Self, BoxError> {
            Ok(Self {
                _leaf: args.take::<Leaf>()?,
            })
        }
    }

    let schema = SchemaRegistry::new().with::<Leaf>().with::<Node>();
    let session = Session::with_schema(Bindings::new(), Vec::new(), Arc::new(schema))
        .expect("session builds");

    // Sequential resolutions each get a fresh trail.
    session.get::<Node>().expect("first resolution");
    session.get::<Node>().expect("second resolution");
    session.get::<Leaf>().expect("leaf on its own");
}
