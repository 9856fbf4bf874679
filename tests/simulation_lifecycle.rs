#[cfg(test)]
mod tests {
    use yee3d::config::{render_request, GridConfig};
    use yee3d::extensions::{BoundaryCondition, FirstOrderAbc};
    use yee3d::fdtd::{FieldComponent, FieldLattice, Simulation, SimulationState};
    use yee3d::output::FieldSliceExporter;
    use yee3d::Error;

    fn quiet(n: usize, max_time: u64) -> Simulation {
        let mut sim = Simulation::with_defaults(n, n, n, max_time).unwrap();
        sim.set_verbose(0).set_show_progress(false);
        sim
    }

    #[test]
    fn test_run_to_completion() {
        let mut sim = quiet(10, 25);
        let stats = sim.run_to_max().unwrap();
        assert_eq!(stats.timesteps, 25);
        assert_eq!(sim.time(), sim.max_time());
        assert_eq!(sim.state(), SimulationState::Finished);
        assert!(matches!(sim.run_to_max(), Err(Error::SimulationComplete { .. })));
        assert!(matches!(sim.run(25), Err(Error::SimulationComplete { .. })));
    }

    #[test]
    fn test_end_time_past_max_is_rejected() {
        let mut sim = quiet(6, 10);
        sim.run(4).unwrap();
        assert!(matches!(
            sim.run(11),
            Err(Error::InvalidTimeRange {
                end_time: 11,
                time: 4,
                max_time: 10
            })
        ));
        assert_eq!(sim.time(), 4);
    }

    #[test]
    fn test_plane_extraction_is_repeatable() {
        let mut sim = quiet(9, 20);
        sim.run(12).unwrap();
        for c in FieldComponent::ALL {
            let first = sim.lattice().extract_plane(c, 1, 3).unwrap();
            let second = sim.lattice().extract_named_plane(c.name(), 1, 3).unwrap();
            assert_eq!(first, second);
        }
        assert_eq!(sim.time(), 12);
    }

    #[test]
    fn test_boundary_outlives_lattice_reset() {
        let mut lattice = FieldLattice::new(6, 6, 6, 10).unwrap();
        let mut abc = FirstOrderAbc::new();
        abc.bind(&lattice).unwrap();
        abc.update(&mut lattice).unwrap();

        lattice.reset();
        assert!(!abc.is_bound_to(&lattice));
        assert!(matches!(abc.update(&mut lattice), Err(Error::NotBound(_))));

        abc.bind(&lattice).unwrap();
        abc.update(&mut lattice).unwrap();
    }

    #[test]
    fn test_record_and_render() {
        let config = GridConfig::new(8, 8, 8, 6);
        let mut sim = config.build_simulation().unwrap();
        sim.set_verbose(0).set_show_progress(false);
        let mut exporter = config.exporter(sim.lattice()).unwrap();
        assert_eq!(exporter.component(), FieldComponent::Hx);
        assert_eq!(exporter.index(), 3);

        exporter.record(&mut sim, 6).unwrap();
        assert_eq!(exporter.frames().len(), 6);

        let path = std::env::temp_dir().join(format!("yee3d-lifecycle-{}.gif", std::process::id()));
        exporter.write_gif(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(bytes.starts_with(b"GIF8"));
    }

    #[test]
    fn test_render_request_errors() {
        let workdir = std::env::temp_dir();
        assert!(matches!(
            render_request("not json", &workdir),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            render_request(r#"{"gridConfig": {"sx": 1, "sy": 4, "sz": 4, "maxTime": 3}}"#, &workdir),
            Err(Error::InvalidDimension { nx: 1, .. })
        ));
        assert!(matches!(
            render_request(
                r#"{"gridConfig": {"sx": 4, "sy": 4, "sz": 4, "maxTime": 3, "field": "Dz"}}"#,
                &workdir
            ),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn test_exporter_frames_track_period() {
        let mut sim = quiet(7, 9);
        let mut exporter = FieldSliceExporter::new(FieldComponent::Ez, 0, 3).with_period(4);
        exporter.record(&mut sim, 9).unwrap();
        // t = 0, 4, 8
        assert_eq!(exporter.frames().len(), 3);
    }
}
