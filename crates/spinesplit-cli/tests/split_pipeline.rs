use assert_cmd::Command;
use std::error::Error;
use std::fs;
use tempfile::tempdir;

const NETWORK_XML: &str = r#"<SpineML>
  <Population>
    <Neuron name="A" size="10" url="neuron.xml"/>
  </Population>
  <Population>
    <Neuron name="B" size="6" url="neuron.xml"/>
    <Projection dst_population="A">
      <Synapse>
        <AllToAllConnection/>
        <WeightUpdate name="B_wu" url="wu.xml" input_src_port="spike" input_dst_port="in"/>
        <PostSynapse name="B_ps" url="ps.xml" input_src_port="in" input_dst_port="in2" output_src_port="out" output_dst_port="out2"/>
      </Synapse>
    </Projection>
  </Population>
</SpineML>
"#;

fn experiment_xml(network_file: &str) -> String {
    format!(
        r#"<SpineML>
  <Experiment>
    <Model network_layer_url="{network_file}"/>
    <Simulation duration="1000">
      <EulerIntegration dt="0.1"/>
    </Simulation>
  </Experiment>
</SpineML>
"#
    )
}

#[test]
fn splits_a_small_network_into_xml_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let network_path = dir.path().join("network.xml");
    let experiment_path = dir.path().join("experiment.xml");
    let output_path = dir.path().join("out.xml");

    fs::write(&network_path, NETWORK_XML)?;
    fs::write(&experiment_path, experiment_xml("network.xml"))?;

    let mut cmd = Command::cargo_bin("spinesplit")?;
    cmd.args([
        experiment_path.to_str().unwrap(),
        output_path.to_str().unwrap(),
        "--cap",
        "4",
        "--silent",
    ]);
    cmd.assert().success();

    assert!(output_path.exists());
    let written = fs::read_to_string(&output_path)?;
    assert!(written.contains("LL:Population"));
    assert!(written.contains("A_sub0"));
    assert!(written.contains("B_sub0"));
    Ok(())
}

#[test]
fn alias_writer_rejects_src_defined_network() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let network_path = dir.path().join("network.xml");
    let experiment_path = dir.path().join("experiment.xml");
    let output_path = dir.path().join("out.alias");

    fs::write(&network_path, NETWORK_XML)?;
    fs::write(&experiment_path, experiment_xml("network.xml"))?;

    let mut cmd = Command::cargo_bin("spinesplit")?;
    cmd.args([
        experiment_path.to_str().unwrap(),
        output_path.to_str().unwrap(),
        "--cap",
        "4",
        "--alias",
        "--silent",
    ]);
    cmd.assert().failure();
    Ok(())
}

#[test]
fn one_to_one_size_mismatch_is_a_fatal_error() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let network_path = dir.path().join("network.xml");
    let experiment_path = dir.path().join("experiment.xml");
    let output_path = dir.path().join("out.xml");

    let mismatched = r#"<SpineML>
  <Population>
    <Neuron name="A" size="6" url="neuron.xml"/>
  </Population>
  <Population>
    <Neuron name="B" size="5" url="neuron.xml"/>
    <Projection dst_population="A">
      <Synapse>
        <OneToOneConnection/>
        <WeightUpdate name="B_wu" url="wu.xml" input_src_port="spike" input_dst_port="in"/>
        <PostSynapse name="B_ps" url="ps.xml" input_src_port="in" input_dst_port="in2" output_src_port="out" output_dst_port="out2"/>
      </Synapse>
    </Projection>
  </Population>
</SpineML>
"#;
    fs::write(&network_path, mismatched)?;
    fs::write(&experiment_path, experiment_xml("network.xml"))?;

    let mut cmd = Command::cargo_bin("spinesplit")?;
    cmd.args([
        experiment_path.to_str().unwrap(),
        output_path.to_str().unwrap(),
        "--cap",
        "4",
        "--silent",
    ]);
    cmd.assert().failure();
    Ok(())
}
